//! Error types for the reward engine.

use std::io;

/// Errors that can occur in reward operations.
///
/// Business-rule refusals (cooldown, daily cap, unknown action) are not
/// errors; they are reported as values in grant results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    InvalidRule { action: String, reason: String },
    DuplicateRule { action: String },
    LedgerVersionMismatch { user_id: String, expected: u64, found: u64 },
    SnapshotFormatMismatch { expected: u64, found: u64 },
    ConfigParse { reason: String },
    Io(String),
    Serde(String),
}

impl From<serde_json::Error> for RewardError {
    fn from(error: serde_json::Error) -> Self {
        RewardError::Serde(error.to_string())
    }
}

impl From<io::Error> for RewardError {
    fn from(error: io::Error) -> Self {
        RewardError::Io(error.to_string())
    }
}
