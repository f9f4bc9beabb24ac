//! Grant eligibility checks: rule lookup, cooldown, and daily cap.

use serde::{Deserialize, Serialize};

use crate::ledger::UserLedger;
use crate::rules::{RewardRule, RuleTable};
use crate::types::{UnixMillis, MILLIS_PER_SECOND};

/// Why a grant attempt was refused. Refusals are expected, frequent, and
/// never surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantRefusal {
    UnknownAction,
    Cooldown,
    DailyCap,
}

/// Outcome tag carried in grant results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOutcome {
    Ok,
    Cooldown,
    DailyCap,
    UnknownAction,
}

impl From<GrantRefusal> for GrantOutcome {
    fn from(refusal: GrantRefusal) -> Self {
        match refusal {
            GrantRefusal::UnknownAction => GrantOutcome::UnknownAction,
            GrantRefusal::Cooldown => GrantOutcome::Cooldown,
            GrantRefusal::DailyCap => GrantOutcome::DailyCap,
        }
    }
}

/// Decide whether a grant of `action` is currently permitted, returning
/// the matched rule so the caller can execute it.
///
/// Unknown actions fail closed. The cooldown comparison is strict: an
/// attempt at exactly `last_grant + cooldown` is refused. A first attempt
/// (no prior grant) is always cooldown-eligible.
pub fn evaluate_grant<'a>(
    ledger: &UserLedger,
    rules: &'a RuleTable,
    action: &str,
    now_ms: UnixMillis,
) -> Result<&'a RewardRule, GrantRefusal> {
    let Some(rule) = rules.rule(action) else {
        return Err(GrantRefusal::UnknownAction);
    };
    if let Some(last_ms) = ledger.last_grant_at(action) {
        let elapsed_ms = now_ms.saturating_sub(last_ms);
        let cooldown_ms = (rule.cooldown_seconds as i64).saturating_mul(MILLIS_PER_SECOND);
        if elapsed_ms <= cooldown_ms {
            return Err(GrantRefusal::Cooldown);
        }
    }
    if ledger.granted_today(action, now_ms) >= rule.max_per_day {
        return Err(GrantRefusal::DailyCap);
    }
    Ok(rule)
}

/// Pure predicate form of [`evaluate_grant`].
pub fn can_grant(ledger: &UserLedger, rules: &RuleTable, action: &str, now_ms: UnixMillis) -> bool {
    evaluate_grant(ledger, rules, action, now_ms).is_ok()
}
