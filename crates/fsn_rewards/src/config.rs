//! Engine configuration loading.
//!
//! Configuration is optional: with no file present the engine runs on the
//! built-in rule table. A TOML file can replace the rule table and tune
//! engine knobs, either at the default path or wherever
//! `FSN_REWARDS_CONFIG` points.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RewardError;
use crate::rules::{RewardRule, RuleTable};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "fsn_rewards.toml";
pub const ENV_CONFIG_PATH: &str = "FSN_REWARDS_CONFIG";
pub const DEFAULT_DAILY_COUNT_RETENTION_DAYS: u32 = 7;

/// Reward engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Rule table entries; empty means "use the built-in table".
    #[serde(default)]
    pub rules: Vec<RewardRule>,
    #[serde(default = "default_retention_days")]
    pub daily_count_retention_days: u32,
}

fn default_retention_days() -> u32 {
    DEFAULT_DAILY_COUNT_RETENTION_DAYS
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            daily_count_retention_days: DEFAULT_DAILY_COUNT_RETENTION_DAYS,
        }
    }
}

impl RewardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, RewardError> {
        let config: RewardConfig =
            toml::from_str(content).map_err(|err| RewardError::ConfigParse {
                reason: err.to_string(),
            })?;
        // Surface invalid rules at load time rather than first use.
        config.rule_table()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, RewardError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `FSN_REWARDS_CONFIG`, else the default file if present,
    /// else defaults.
    pub fn load() -> Result<Self, RewardError> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Self::from_path(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE_NAME);
        if default_path.exists() {
            return Self::from_path(default_path);
        }
        Ok(Self::default())
    }

    pub fn rule_table(&self) -> Result<RuleTable, RewardError> {
        if self.rules.is_empty() {
            return Ok(RuleTable::builtin());
        }
        RuleTable::from_rules(self.rules.iter().cloned())
    }
}
