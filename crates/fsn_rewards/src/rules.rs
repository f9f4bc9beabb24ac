//! Reward rule table: per-action XP amounts, cooldowns, and daily caps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RewardError;

// Platform wire identifiers for the built-in actions. The spelling is
// owned by the platform API and is opaque to the engine.
pub const ACTION_VAULT_UPLOAD: &str = "vaultUpload";
pub const ACTION_DAILY_LOGIN: &str = "dailyLogin";
pub const ACTION_PROFILE_UPDATE: &str = "profileUpdate";
pub const ACTION_AGENT_MESSAGE: &str = "agentMessage";
pub const ACTION_REFERRAL_BONUS: &str = "referralBonus";

/// Static per-action grant policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRule {
    pub action: String,
    pub amount: u64,
    pub cooldown_seconds: u64,
    pub max_per_day: u32,
}

impl RewardRule {
    pub fn new(
        action: impl Into<String>,
        amount: u64,
        cooldown_seconds: u64,
        max_per_day: u32,
    ) -> Self {
        Self {
            action: action.into(),
            amount,
            cooldown_seconds,
            max_per_day,
        }
    }
}

/// Read-only map from action name to its grant rule.
///
/// Unknown actions have no rule and are never grantable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleTable {
    rules: BTreeMap<String, RewardRule>,
}

impl RuleTable {
    /// Rule table covering the built-in platform actions.
    pub fn builtin() -> Self {
        let rules = vec![
            RewardRule::new(ACTION_VAULT_UPLOAD, 50, 300, 10),
            RewardRule::new(ACTION_DAILY_LOGIN, 25, 0, 1),
            RewardRule::new(ACTION_PROFILE_UPDATE, 10, 3_600, 3),
            RewardRule::new(ACTION_AGENT_MESSAGE, 5, 60, 20),
            RewardRule::new(ACTION_REFERRAL_BONUS, 100, 0, 1),
        ];
        Self::from_rules(rules).expect("builtin rule table is valid")
    }

    pub fn from_rules(
        rules: impl IntoIterator<Item = RewardRule>,
    ) -> Result<Self, RewardError> {
        let mut table = BTreeMap::new();
        for rule in rules {
            validate_rule(&rule)?;
            if table.contains_key(&rule.action) {
                return Err(RewardError::DuplicateRule {
                    action: rule.action,
                });
            }
            table.insert(rule.action.clone(), rule);
        }
        Ok(Self { rules: table })
    }

    pub fn rule(&self, action: &str) -> Option<&RewardRule> {
        self.rules.get(action)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate_rule(rule: &RewardRule) -> Result<(), RewardError> {
    if rule.action.trim().is_empty() {
        return Err(RewardError::InvalidRule {
            action: rule.action.clone(),
            reason: "action name cannot be empty".to_string(),
        });
    }
    if rule.amount == 0 {
        return Err(RewardError::InvalidRule {
            action: rule.action.clone(),
            reason: "amount must be positive".to_string(),
        });
    }
    if rule.max_per_day == 0 {
        return Err(RewardError::InvalidRule {
            action: rule.action.clone(),
            reason: "max_per_day must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_platform_actions() {
        let table = RuleTable::builtin();
        for action in [
            ACTION_VAULT_UPLOAD,
            ACTION_DAILY_LOGIN,
            ACTION_PROFILE_UPDATE,
            ACTION_AGENT_MESSAGE,
            ACTION_REFERRAL_BONUS,
        ] {
            assert!(table.rule(action).is_some(), "missing rule for {action}");
        }
    }

    #[test]
    fn unknown_action_has_no_rule() {
        let table = RuleTable::builtin();
        assert!(table.rule("totallyMadeUpAction").is_none());
    }

    #[test]
    fn zero_amount_rule_is_rejected() {
        let err = RuleTable::from_rules(vec![RewardRule::new("broken", 0, 0, 1)]).unwrap_err();
        assert!(matches!(err, RewardError::InvalidRule { .. }));
    }

    #[test]
    fn zero_cap_rule_is_rejected() {
        let err = RuleTable::from_rules(vec![RewardRule::new("broken", 10, 0, 0)]).unwrap_err();
        assert!(matches!(err, RewardError::InvalidRule { .. }));
    }

    #[test]
    fn duplicate_action_is_rejected() {
        let err = RuleTable::from_rules(vec![
            RewardRule::new("vaultUpload", 50, 0, 1),
            RewardRule::new("vaultUpload", 25, 0, 1),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RewardError::DuplicateRule {
                action: "vaultUpload".to_string()
            }
        );
    }

    #[test]
    fn zero_cooldown_is_allowed() {
        let table = RuleTable::from_rules(vec![RewardRule::new("login", 5, 0, 1)]).unwrap();
        assert_eq!(table.rule("login").unwrap().cooldown_seconds, 0);
    }
}
