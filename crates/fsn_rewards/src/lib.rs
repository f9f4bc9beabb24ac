//! FreeSpace Network reward engine.
//!
//! The XP subsystem behind the platform's progression mechanics:
//! - a static rule table (per-action XP amount, cooldown, daily cap),
//! - a per-user XP ledger with per-UTC-day grant counters,
//! - a pure grant gate and an atomic grant executor,
//! - status derivers (Pulse level, Signal status, Beacon eligibility),
//! - per-action handlers reporting structured outcomes,
//! - a ledger store boundary with in-memory and file-backed stores.
//!
//! Grant refusals (cooldown, daily cap, unknown action) are ordinary
//! results, never errors: the platform action a grant is attached to
//! must succeed or fail on its own.

mod audit;
mod config;
mod engine;
mod error;
mod gate;
mod handlers;
mod ledger;
mod rules;
mod status;
mod store;
mod types;
mod util;

#[cfg(test)]
mod tests;

// Audit
pub use audit::{
    GrantEvent, GrantEventFilter, GrantEventKind, GrantEventLog, GRANT_EVENT_ID_V1_PREFIX,
};

// Configuration
pub use config::{
    RewardConfig, DEFAULT_CONFIG_FILE_NAME, DEFAULT_DAILY_COUNT_RETENTION_DAYS, ENV_CONFIG_PATH,
};

// Engine
pub use engine::{GrantAttempt, RewardEngine, DEFAULT_AUDIT_LOG_CAPACITY};

// Error
pub use error::RewardError;

// Grant gate
pub use gate::{can_grant, evaluate_grant, GrantOutcome, GrantRefusal};

// Action handlers
pub use handlers::ActionOutcome;

// Ledger
pub use ledger::UserLedger;

// Rules
pub use rules::{
    RewardRule, RuleTable, ACTION_AGENT_MESSAGE, ACTION_DAILY_LOGIN, ACTION_PROFILE_UPDATE,
    ACTION_REFERRAL_BONUS, ACTION_VAULT_UPLOAD,
};

// Status derivers
pub use status::{
    beacon_eligible, pulse_active, PulseLevel, SignalStatus, BEACON_MIN_STREAK_DAYS,
    PULSE_CORE_MIN_XP, PULSE_SENTINEL_MIN_XP, PULSE_STABLE_MIN_XP, SIGNAL_BASIC_OVER_XP,
    SIGNAL_CORE_OVER_XP, SIGNAL_SENTINEL_OVER_XP,
};

// Stores
pub use store::{FileLedgerStore, LedgerStore, MemoryLedgerStore, VersionedLedger};

// Types
pub use types::{day_key, now_ms, previous_day_key, UnixMillis, UserId};

// Utilities
pub use util::sha256_hex;
