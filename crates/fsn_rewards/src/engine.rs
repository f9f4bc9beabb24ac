//! Reward engine: serialized grant attempts over a ledger store.
//!
//! The gate/executor pair is a read-modify-write on the user ledger, so
//! every attempt runs under a per-user mutex; two concurrent attempts for
//! the same user can never both pass the gate. The store's version check
//! additionally rejects stale writes when several engine instances share
//! one store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::audit::{GrantEvent, GrantEventFilter, GrantEventKind, GrantEventLog};
use crate::config::{RewardConfig, DEFAULT_DAILY_COUNT_RETENTION_DAYS};
use crate::error::RewardError;
use crate::gate::{evaluate_grant, GrantOutcome, GrantRefusal};
use crate::ledger::UserLedger;
use crate::rules::{RuleTable, ACTION_REFERRAL_BONUS};
use crate::status::{pulse_active, SignalStatus};
use crate::store::{LedgerStore, VersionedLedger};
use crate::types::{now_ms, UnixMillis, UserId};

pub const DEFAULT_AUDIT_LOG_CAPACITY: usize = 1_024;

/// Result of one grant attempt. Refusals are ordinary results, not
/// errors; only infrastructure failures surface as `RewardError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantAttempt {
    pub granted: bool,
    pub reason: GrantOutcome,
    pub awarded_xp: u64,
    pub total_xp: u64,
}

pub struct RewardEngine {
    rules: RuleTable,
    store: Arc<dyn LedgerStore>,
    now_fn: Arc<dyn Fn() -> UnixMillis + Send + Sync>,
    user_locks: Mutex<BTreeMap<UserId, Arc<Mutex<()>>>>,
    audit: GrantEventLog,
    daily_count_retention_days: u32,
}

impl RewardEngine {
    pub fn new(rules: RuleTable, store: Arc<dyn LedgerStore>) -> Self {
        Self::new_with_clock(rules, store, Arc::new(now_ms))
    }

    pub fn new_with_clock(
        rules: RuleTable,
        store: Arc<dyn LedgerStore>,
        now_fn: Arc<dyn Fn() -> UnixMillis + Send + Sync>,
    ) -> Self {
        Self {
            rules,
            store,
            now_fn,
            user_locks: Mutex::new(BTreeMap::new()),
            audit: GrantEventLog::new(DEFAULT_AUDIT_LOG_CAPACITY),
            daily_count_retention_days: DEFAULT_DAILY_COUNT_RETENTION_DAYS,
        }
    }

    pub fn from_config(
        config: &RewardConfig,
        store: Arc<dyn LedgerStore>,
    ) -> Result<Self, RewardError> {
        let mut engine = Self::new(config.rule_table()?, store);
        engine.daily_count_retention_days = config.daily_count_retention_days;
        Ok(engine)
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Read-only view of a user's ledger, if any grants were recorded.
    pub fn ledger(&self, user_id: &str) -> Result<Option<UserLedger>, RewardError> {
        Ok(self.store.load(user_id)?.map(|entry| entry.ledger))
    }

    pub fn audit_events(&self, filter: &GrantEventFilter) -> Vec<GrantEvent> {
        self.audit.events(filter)
    }

    /// Attempt to grant XP for `action`, enforcing the action's cooldown
    /// and daily cap. A refused grant is a silent no-op from the
    /// platform's point of view; the primary user action proceeds
    /// regardless.
    pub fn attempt_grant(
        &self,
        user_id: &str,
        action: &str,
    ) -> Result<GrantAttempt, RewardError> {
        self.attempt_grant_with_fields(user_id, action)
            .map(|(attempt, _)| attempt)
    }

    /// Grant the one-time referral bonus unless it was already paid.
    /// Returns whether XP was awarded; repeat calls are no-ops.
    pub fn check_and_grant_referral_bonus(&self, user_id: &str) -> Result<bool, RewardError> {
        self.referral_bonus_with_fields(user_id)
            .map(|(granted, _)| granted)
    }

    pub(crate) fn attempt_grant_with_fields(
        &self,
        user_id: &str,
        action: &str,
    ) -> Result<(GrantAttempt, Vec<String>), RewardError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().expect("lock user");
        let now = (self.now_fn)();
        let VersionedLedger {
            mut ledger,
            version,
        } = self.load_or_new(user_id)?;

        let rule = match evaluate_grant(&ledger, &self.rules, action, now) {
            Ok(rule) => rule,
            Err(refusal) => {
                if refusal == GrantRefusal::UnknownAction {
                    tracing::warn!("grant attempt for unknown action: {}", action);
                }
                self.audit.append(GrantEvent::new(
                    GrantEventKind::Refused,
                    user_id,
                    action,
                    0,
                    Some(refusal),
                    ledger.total_xp,
                    now,
                ));
                return Ok((
                    GrantAttempt {
                        granted: false,
                        reason: refusal.into(),
                        awarded_xp: 0,
                        total_xp: ledger.total_xp,
                    },
                    Vec::new(),
                ));
            }
        };

        let amount = rule.amount;
        ledger.record_grant(action, amount, now);
        ledger.prune_daily_counts(now, self.daily_count_retention_days);
        let mut updated_fields = vec![
            "total_xp".to_string(),
            format!("last_grant_at.{action}"),
        ];
        updated_fields.extend(refresh_derived(&mut ledger));
        self.store.save(&ledger, version)?;
        self.audit.append(GrantEvent::new(
            GrantEventKind::Granted,
            user_id,
            action,
            amount,
            None,
            ledger.total_xp,
            now,
        ));
        Ok((
            GrantAttempt {
                granted: true,
                reason: GrantOutcome::Ok,
                awarded_xp: amount,
                total_xp: ledger.total_xp,
            },
            updated_fields,
        ))
    }

    pub(crate) fn referral_bonus_with_fields(
        &self,
        user_id: &str,
    ) -> Result<(bool, Vec<String>), RewardError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().expect("lock user");
        let now = (self.now_fn)();
        let VersionedLedger {
            mut ledger,
            version,
        } = self.load_or_new(user_id)?;

        if ledger.referral_bonus_given {
            return Ok((false, Vec::new()));
        }
        let Some(rule) = self.rules.rule(ACTION_REFERRAL_BONUS) else {
            // No referral rule configured: fail closed, like any unknown
            // action.
            tracing::warn!("referral bonus attempted with no {} rule", ACTION_REFERRAL_BONUS);
            return Ok((false, Vec::new()));
        };

        let amount = rule.amount;
        ledger.record_grant(ACTION_REFERRAL_BONUS, amount, now);
        ledger.referral_bonus_given = true;
        ledger.prune_daily_counts(now, self.daily_count_retention_days);
        let mut updated_fields = vec![
            "total_xp".to_string(),
            "referral_bonus_given".to_string(),
        ];
        updated_fields.extend(refresh_derived(&mut ledger));
        self.store.save(&ledger, version)?;
        self.audit.append(GrantEvent::new(
            GrantEventKind::ReferralBonus,
            user_id,
            ACTION_REFERRAL_BONUS,
            amount,
            None,
            ledger.total_xp,
            now,
        ));
        Ok((true, updated_fields))
    }

    pub(crate) fn record_login_with_fields(
        &self,
        user_id: &str,
    ) -> Result<Vec<String>, RewardError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().expect("lock user");
        let now = (self.now_fn)();
        let VersionedLedger {
            mut ledger,
            version,
        } = self.load_or_new(user_id)?;

        if !ledger.record_login_day(now) {
            return Ok(Vec::new());
        }
        self.store.save(&ledger, version)?;
        Ok(vec![
            "login_streak_days".to_string(),
            "last_login_day".to_string(),
        ])
    }

    fn load_or_new(&self, user_id: &str) -> Result<VersionedLedger, RewardError> {
        Ok(self.store.load(user_id)?.unwrap_or_else(|| VersionedLedger {
            ledger: UserLedger::new(user_id),
            version: 0,
        }))
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().expect("lock user lock map");
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Recompute the cached derived statuses; returns the names of fields
/// that changed.
fn refresh_derived(ledger: &mut UserLedger) -> Vec<String> {
    let mut updated = Vec::new();
    let signal = SignalStatus::from_total_xp(ledger.total_xp);
    if signal != ledger.signal_status {
        ledger.signal_status = signal;
        updated.push("signal_status".to_string());
    }
    let qualified = pulse_active(ledger.total_xp);
    if qualified != ledger.pulse_qualified {
        ledger.pulse_qualified = qualified;
        updated.push("pulse_qualified".to_string());
    }
    updated
}
