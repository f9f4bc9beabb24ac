//! Audit records for grant attempts.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::gate::GrantRefusal;
use crate::types::{UnixMillis, UserId};
use crate::util::sha256_hex;

pub const GRANT_EVENT_ID_V1_PREFIX: &str = "grant:v1:";

/// Kinds of grant events for audit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantEventKind {
    Granted,
    Refused,
    ReferralBonus,
}

/// One grant attempt as observed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEvent {
    pub event_id: String,
    pub kind: GrantEventKind,
    pub user_id: UserId,
    pub action: String,
    pub amount: u64,
    #[serde(default)]
    pub refusal: Option<GrantRefusal>,
    pub total_xp_after: u64,
    pub at_ms: UnixMillis,
}

impl GrantEvent {
    pub fn new(
        kind: GrantEventKind,
        user_id: impl Into<UserId>,
        action: impl Into<String>,
        amount: u64,
        refusal: Option<GrantRefusal>,
        total_xp_after: u64,
        at_ms: UnixMillis,
    ) -> Self {
        let user_id = user_id.into();
        let action = action.into();
        let payload = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            kind_tag(kind),
            user_id,
            action,
            amount,
            refusal.map(refusal_tag).unwrap_or("-"),
            total_xp_after,
            at_ms
        );
        let event_id = format!(
            "{GRANT_EVENT_ID_V1_PREFIX}{}",
            sha256_hex(payload.as_bytes())
        );
        Self {
            event_id,
            kind,
            user_id,
            action,
            amount,
            refusal,
            total_xp_after,
            at_ms,
        }
    }
}

fn kind_tag(kind: GrantEventKind) -> &'static str {
    match kind {
        GrantEventKind::Granted => "granted",
        GrantEventKind::Refused => "refused",
        GrantEventKind::ReferralBonus => "referral_bonus",
    }
}

fn refusal_tag(refusal: GrantRefusal) -> &'static str {
    match refusal {
        GrantRefusal::UnknownAction => "unknown_action",
        GrantRefusal::Cooldown => "cooldown",
        GrantRefusal::DailyCap => "daily_cap",
    }
}

/// Filter criteria for grant events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GrantEventFilter {
    pub kinds: Option<Vec<GrantEventKind>>,
    pub user_id: Option<UserId>,
    pub action: Option<String>,
    pub from_ms: Option<UnixMillis>,
    pub to_ms: Option<UnixMillis>,
}

impl GrantEventFilter {
    pub fn matches(&self, event: &GrantEvent) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &event.user_id != user_id {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &event.action != action {
                return false;
            }
        }
        if let Some(from_ms) = self.from_ms {
            if event.at_ms < from_ms {
                return false;
            }
        }
        if let Some(to_ms) = self.to_ms {
            if event.at_ms > to_ms {
                return false;
            }
        }
        true
    }
}

/// Bounded in-memory log of recent grant events; the oldest entries are
/// dropped once capacity is reached.
#[derive(Debug)]
pub struct GrantEventLog {
    capacity: usize,
    events: Mutex<VecDeque<GrantEvent>>,
}

impl GrantEventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
        }
    }

    pub fn append(&self, event: GrantEvent) {
        let mut events = self.events.lock().expect("lock events");
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn events(&self, filter: &GrantEventFilter) -> Vec<GrantEvent> {
        let events = self.events.lock().expect("lock events");
        events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("lock events").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(user_id: &str, action: &str, at_ms: UnixMillis) -> GrantEvent {
        GrantEvent::new(
            GrantEventKind::Granted,
            user_id,
            action,
            50,
            None,
            50,
            at_ms,
        )
    }

    #[test]
    fn event_ids_are_deterministic_and_prefixed() {
        let first = granted("user-1", "vaultUpload", 10);
        let second = granted("user-1", "vaultUpload", 10);
        assert_eq!(first.event_id, second.event_id);
        assert!(first.event_id.starts_with(GRANT_EVENT_ID_V1_PREFIX));

        let other = granted("user-2", "vaultUpload", 10);
        assert_ne!(first.event_id, other.event_id);
    }

    #[test]
    fn filter_matches_kind_user_and_time_range() {
        let event = granted("user-1", "vaultUpload", 100);

        assert!(GrantEventFilter::default().matches(&event));
        assert!(GrantEventFilter {
            kinds: Some(vec![GrantEventKind::Granted]),
            user_id: Some("user-1".to_string()),
            from_ms: Some(50),
            to_ms: Some(150),
            ..GrantEventFilter::default()
        }
        .matches(&event));

        assert!(!GrantEventFilter {
            kinds: Some(vec![GrantEventKind::Refused]),
            ..GrantEventFilter::default()
        }
        .matches(&event));
        assert!(!GrantEventFilter {
            user_id: Some("user-2".to_string()),
            ..GrantEventFilter::default()
        }
        .matches(&event));
        assert!(!GrantEventFilter {
            to_ms: Some(99),
            ..GrantEventFilter::default()
        }
        .matches(&event));
    }

    #[test]
    fn log_drops_oldest_beyond_capacity() {
        let log = GrantEventLog::new(2);
        log.append(granted("user-1", "vaultUpload", 1));
        log.append(granted("user-1", "vaultUpload", 2));
        log.append(granted("user-1", "vaultUpload", 3));

        let events = log.events(&GrantEventFilter::default());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at_ms, 2);
        assert_eq!(events[1].at_ms, 3);
    }

    #[test]
    fn filter_by_action() {
        let log = GrantEventLog::new(8);
        log.append(granted("user-1", "vaultUpload", 1));
        log.append(granted("user-1", "dailyLogin", 2));

        let uploads = log.events(&GrantEventFilter {
            action: Some("vaultUpload".to_string()),
            ..GrantEventFilter::default()
        });
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].action, "vaultUpload");
    }
}
