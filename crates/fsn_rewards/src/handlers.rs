//! Per-action orchestration over the reward engine.
//!
//! Handlers share one template: attempt the grant, run any side grants
//! for the action, then report the user's current statuses and exactly
//! which ledger fields changed so the platform layer knows what to
//! refresh. A refused grant never fails the primary action.

use serde::{Deserialize, Serialize};

use crate::engine::RewardEngine;
use crate::error::RewardError;
use crate::rules::{
    ACTION_AGENT_MESSAGE, ACTION_DAILY_LOGIN, ACTION_PROFILE_UPDATE, ACTION_VAULT_UPLOAD,
};
use crate::status::SignalStatus;

/// What an action handler changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub xp_granted: bool,
    pub referral_xp_granted: bool,
    pub signal: SignalStatus,
    pub pulse_qualified: bool,
    pub updated_fields: Vec<String>,
}

impl RewardEngine {
    /// A file landed in the user's vault. Also attempts the one-time
    /// referral bonus, independently of the upload grant.
    pub fn handle_vault_upload(&self, user_id: &str) -> Result<ActionOutcome, RewardError> {
        let (attempt, mut updated_fields) =
            self.attempt_grant_with_fields(user_id, ACTION_VAULT_UPLOAD)?;
        let (referral_granted, referral_fields) = self.referral_bonus_with_fields(user_id)?;
        extend_unique(&mut updated_fields, referral_fields);
        self.finish_outcome(user_id, attempt.granted, referral_granted, updated_fields)
    }

    /// Daily login: grants at most once per UTC day and maintains the
    /// consecutive-login streak either way.
    pub fn handle_daily_login(&self, user_id: &str) -> Result<ActionOutcome, RewardError> {
        let (attempt, mut updated_fields) =
            self.attempt_grant_with_fields(user_id, ACTION_DAILY_LOGIN)?;
        let streak_fields = self.record_login_with_fields(user_id)?;
        extend_unique(&mut updated_fields, streak_fields);
        self.finish_outcome(user_id, attempt.granted, false, updated_fields)
    }

    pub fn handle_profile_update(&self, user_id: &str) -> Result<ActionOutcome, RewardError> {
        let (attempt, updated_fields) =
            self.attempt_grant_with_fields(user_id, ACTION_PROFILE_UPDATE)?;
        self.finish_outcome(user_id, attempt.granted, false, updated_fields)
    }

    pub fn handle_agent_message(&self, user_id: &str) -> Result<ActionOutcome, RewardError> {
        let (attempt, updated_fields) =
            self.attempt_grant_with_fields(user_id, ACTION_AGENT_MESSAGE)?;
        self.finish_outcome(user_id, attempt.granted, false, updated_fields)
    }

    fn finish_outcome(
        &self,
        user_id: &str,
        xp_granted: bool,
        referral_xp_granted: bool,
        updated_fields: Vec<String>,
    ) -> Result<ActionOutcome, RewardError> {
        let (signal, pulse_qualified) = match self.ledger(user_id)? {
            Some(ledger) => (ledger.signal_status, ledger.pulse_qualified),
            None => (SignalStatus::None, false),
        };
        Ok(ActionOutcome {
            xp_granted,
            referral_xp_granted,
            signal,
            pulse_qualified,
            updated_fields,
        })
    }
}

fn extend_unique(fields: &mut Vec<String>, extra: Vec<String>) {
    for field in extra {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::rules::{RewardRule, RuleTable, ACTION_REFERRAL_BONUS};
    use crate::store::MemoryLedgerStore;
    use crate::types::{UnixMillis, MILLIS_PER_DAY};

    const T0: UnixMillis = 1_709_596_800_000; // 2024-03-05T00:00:00Z

    fn engine(clock: Arc<AtomicI64>) -> RewardEngine {
        let table = RuleTable::from_rules(vec![
            RewardRule::new(ACTION_VAULT_UPLOAD, 50, 0, 2),
            RewardRule::new(ACTION_DAILY_LOGIN, 25, 0, 1),
            RewardRule::new(ACTION_PROFILE_UPDATE, 10, 3_600, 3),
            RewardRule::new(ACTION_AGENT_MESSAGE, 5, 0, 20),
            RewardRule::new(ACTION_REFERRAL_BONUS, 100, 0, 1),
        ])
        .expect("valid table");
        let now_fn = {
            let clock = clock.clone();
            Arc::new(move || clock.load(Ordering::SeqCst))
        };
        RewardEngine::new_with_clock(table, Arc::new(MemoryLedgerStore::new()), now_fn)
    }

    #[test]
    fn vault_upload_grants_action_and_referral_once() {
        let clock = Arc::new(AtomicI64::new(T0));
        let engine = engine(clock.clone());

        let outcome = engine.handle_vault_upload("user-1").expect("first upload");
        assert!(outcome.xp_granted);
        assert!(outcome.referral_xp_granted);
        // 50 upload + 100 referral.
        let ledger = engine.ledger("user-1").expect("load").expect("present");
        assert_eq!(ledger.total_xp, 150);
        assert!(outcome.updated_fields.contains(&"total_xp".to_string()));
        assert!(outcome
            .updated_fields
            .contains(&"last_grant_at.vaultUpload".to_string()));
        assert!(outcome
            .updated_fields
            .contains(&"referral_bonus_given".to_string()));
        // 150 XP clears the strict `> 100` Core threshold.
        assert_eq!(outcome.signal, SignalStatus::Core);
        assert!(outcome.pulse_qualified);

        clock.store(T0 + 1_000, Ordering::SeqCst);
        let second = engine.handle_vault_upload("user-1").expect("second upload");
        assert!(second.xp_granted);
        assert!(!second.referral_xp_granted);
    }

    #[test]
    fn capped_upload_still_reports_statuses() {
        let clock = Arc::new(AtomicI64::new(T0));
        let engine = engine(clock.clone());

        engine.handle_vault_upload("user-1").expect("first");
        clock.store(T0 + 1_000, Ordering::SeqCst);
        engine.handle_vault_upload("user-1").expect("second");
        clock.store(T0 + 2_000, Ordering::SeqCst);
        let third = engine.handle_vault_upload("user-1").expect("third");
        assert!(!third.xp_granted);
        assert!(!third.referral_xp_granted);
        assert_eq!(
            third.updated_fields,
            Vec::<String>::new(),
            "a fully refused attempt changes nothing"
        );
        assert!(third.pulse_qualified);
    }

    #[test]
    fn daily_login_updates_streak_even_when_grant_is_capped() {
        let clock = Arc::new(AtomicI64::new(T0));
        let engine = engine(clock.clone());

        let first = engine.handle_daily_login("user-1").expect("first login");
        assert!(first.xp_granted);
        assert!(first
            .updated_fields
            .contains(&"login_streak_days".to_string()));

        // Second login the same day: grant capped, streak unchanged.
        clock.store(T0 + 1_000, Ordering::SeqCst);
        let second = engine.handle_daily_login("user-1").expect("second login");
        assert!(!second.xp_granted);
        assert!(second.updated_fields.is_empty());

        // Next day the streak advances alongside the grant.
        clock.store(T0 + MILLIS_PER_DAY, Ordering::SeqCst);
        let next_day = engine.handle_daily_login("user-1").expect("next day");
        assert!(next_day.xp_granted);
        let ledger = engine.ledger("user-1").expect("load").expect("present");
        assert_eq!(ledger.login_streak_days, 2);
    }

    #[test]
    fn profile_update_and_agent_message_grant_without_referral() {
        let clock = Arc::new(AtomicI64::new(T0));
        let engine = engine(clock);

        let profile = engine.handle_profile_update("user-1").expect("profile");
        assert!(profile.xp_granted);
        assert!(!profile.referral_xp_granted);

        let message = engine.handle_agent_message("user-1").expect("message");
        assert!(message.xp_granted);
        let ledger = engine.ledger("user-1").expect("load").expect("present");
        assert_eq!(ledger.total_xp, 15);
    }
}
