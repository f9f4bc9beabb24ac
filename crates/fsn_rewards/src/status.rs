//! Status derivation from cumulative XP.
//!
//! Pulse and Signal are independent step functions of total XP with
//! deliberately different boundary conventions: Pulse tiers are inclusive
//! (`>=`) above a strict `> 0` entry level, Signal tiers are strict (`>`)
//! throughout. The thresholds are platform constants and must not be
//! normalized to one convention.

use serde::{Deserialize, Serialize};

pub const PULSE_SENTINEL_MIN_XP: u64 = 1_000;
pub const PULSE_CORE_MIN_XP: u64 = 500;
pub const PULSE_STABLE_MIN_XP: u64 = 250;

pub const SIGNAL_SENTINEL_OVER_XP: u64 = 200;
pub const SIGNAL_CORE_OVER_XP: u64 = 100;
pub const SIGNAL_BASIC_OVER_XP: u64 = 50;

pub const BEACON_MIN_STREAK_DAYS: u32 = 7;

/// Activity tier derived from cumulative XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseLevel {
    Inactive,
    Initial,
    Stable,
    Core,
    Sentinel,
}

impl PulseLevel {
    pub fn from_total_xp(total_xp: u64) -> Self {
        if total_xp >= PULSE_SENTINEL_MIN_XP {
            PulseLevel::Sentinel
        } else if total_xp >= PULSE_CORE_MIN_XP {
            PulseLevel::Core
        } else if total_xp >= PULSE_STABLE_MIN_XP {
            PulseLevel::Stable
        } else if total_xp > 0 {
            PulseLevel::Initial
        } else {
            PulseLevel::Inactive
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            PulseLevel::Inactive => 0,
            PulseLevel::Initial => 1,
            PulseLevel::Stable => 2,
            PulseLevel::Core => 3,
            PulseLevel::Sentinel => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PulseLevel::Inactive => "Inactive",
            PulseLevel::Initial => "Initial Pulse",
            PulseLevel::Stable => "Stable Pulse",
            PulseLevel::Core => "Core Pulse",
            PulseLevel::Sentinel => "Sentinel Pulse",
        }
    }
}

/// Broadcast tier derived from cumulative XP, gating messaging features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    None,
    Basic,
    Core,
    Sentinel,
}

impl Default for SignalStatus {
    fn default() -> Self {
        SignalStatus::None
    }
}

impl SignalStatus {
    pub fn from_total_xp(total_xp: u64) -> Self {
        if total_xp > SIGNAL_SENTINEL_OVER_XP {
            SignalStatus::Sentinel
        } else if total_xp > SIGNAL_CORE_OVER_XP {
            SignalStatus::Core
        } else if total_xp > SIGNAL_BASIC_OVER_XP {
            SignalStatus::Basic
        } else {
            SignalStatus::None
        }
    }
}

/// Whether the user counts as active at all.
pub fn pulse_active(total_xp: u64) -> bool {
    total_xp > 0
}

/// Network-wide visibility eligibility, composed from Signal, Pulse, and
/// the login streak.
pub fn beacon_eligible(total_xp: u64, login_streak_days: u32) -> bool {
    SignalStatus::from_total_xp(total_xp) >= SignalStatus::Core
        && PulseLevel::from_total_xp(total_xp) >= PulseLevel::Stable
        && login_streak_days >= BEACON_MIN_STREAK_DAYS
}
