//! Per-user XP ledger state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::SignalStatus;
use crate::types::{day_key, previous_day_key, UnixMillis, UserId};

/// Mutable per-user reward state.
///
/// Owned exclusively by the reward engine; collaborators read derived
/// values only. `total_xp` is monotonically non-decreasing: nothing in
/// this subsystem removes XP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLedger {
    pub user_id: UserId,
    pub total_xp: u64,
    #[serde(default)]
    pub last_grant_at_ms: BTreeMap<String, UnixMillis>,
    #[serde(default)]
    pub daily_grant_count: BTreeMap<String, BTreeMap<String, u32>>,
    #[serde(default)]
    pub referral_bonus_given: bool,
    #[serde(default)]
    pub login_streak_days: u32,
    #[serde(default)]
    pub last_login_day: Option<String>,
    #[serde(default)]
    pub signal_status: SignalStatus,
    #[serde(default)]
    pub pulse_qualified: bool,
}

impl UserLedger {
    /// Fresh ledger for a user who has never earned XP.
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            total_xp: 0,
            last_grant_at_ms: BTreeMap::new(),
            daily_grant_count: BTreeMap::new(),
            referral_bonus_given: false,
            login_streak_days: 0,
            last_login_day: None,
            signal_status: SignalStatus::None,
            pulse_qualified: false,
        }
    }

    pub fn last_grant_at(&self, action: &str) -> Option<UnixMillis> {
        self.last_grant_at_ms.get(action).copied()
    }

    /// Successful grants of `action` on the UTC calendar day of `now_ms`.
    pub fn granted_today(&self, action: &str, now_ms: UnixMillis) -> u32 {
        self.daily_grant_count
            .get(&day_key(now_ms))
            .and_then(|by_action| by_action.get(action))
            .copied()
            .unwrap_or(0)
    }

    /// Record one successful grant: bump the daily counter, add the XP,
    /// and stamp the last-grant time.
    ///
    /// The three effects are intentionally one method so no call site can
    /// record a grant without paying the XP or vice versa. Callers must
    /// have consulted the grant gate first.
    pub fn record_grant(&mut self, action: &str, amount: u64, now_ms: UnixMillis) {
        let day = day_key(now_ms);
        let count = self
            .daily_grant_count
            .entry(day)
            .or_default()
            .entry(action.to_string())
            .or_insert(0);
        *count = count.saturating_add(1);
        self.total_xp = self.total_xp.saturating_add(amount);
        self.last_grant_at_ms.insert(action.to_string(), now_ms);
    }

    /// Drop daily counters older than `keep_days` UTC days before `now_ms`.
    /// The current day is always kept. Only the current day is ever read
    /// by the grant gate; old keys are purely historical.
    pub fn prune_daily_counts(&mut self, now_ms: UnixMillis, keep_days: u32) {
        let cutoff_ms =
            now_ms.saturating_sub((keep_days as i64).saturating_mul(crate::types::MILLIS_PER_DAY));
        let cutoff_day = day_key(cutoff_ms);
        self.daily_grant_count.retain(|day, _| day >= &cutoff_day);
    }

    /// Update the consecutive-login streak for a login at `now_ms`.
    /// Returns true when the streak fields changed.
    pub fn record_login_day(&mut self, now_ms: UnixMillis) -> bool {
        let today = day_key(now_ms);
        match self.last_login_day.as_deref() {
            Some(day) if day == today => false,
            Some(day) if day == previous_day_key(now_ms) => {
                self.login_streak_days = self.login_streak_days.saturating_add(1);
                self.last_login_day = Some(today);
                true
            }
            _ => {
                self.login_streak_days = 1;
                self.last_login_day = Some(today);
                true
            }
        }
    }
}
