//! Ledger persistence: store trait, in-memory store, and file-backed store.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::RewardError;
use crate::ledger::UserLedger;
use crate::types::{now_ms, UnixMillis, UserId};
use crate::util::{sha256_hex, write_json_atomic};

const SNAPSHOT_FORMAT_VERSION: u64 = 1;

/// A ledger paired with the store version it was loaded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedLedger {
    pub ledger: UserLedger,
    pub version: u64,
}

/// Durable home of user ledgers.
///
/// Saves carry the version the caller loaded (0 for a user with no
/// stored ledger); a save against a stale version fails with
/// [`RewardError::LedgerVersionMismatch`] so concurrent writers cannot
/// silently overwrite each other.
pub trait LedgerStore: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<VersionedLedger>, RewardError>;
    fn save(&self, ledger: &UserLedger, expected_version: u64) -> Result<u64, RewardError>;
}

/// In-memory ledger store.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledgers: Mutex<BTreeMap<UserId, VersionedLedger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ledgers.lock().expect("lock ledgers").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self, user_id: &str) -> Result<Option<VersionedLedger>, RewardError> {
        let ledgers = self.ledgers.lock().expect("lock ledgers");
        Ok(ledgers.get(user_id).cloned())
    }

    fn save(&self, ledger: &UserLedger, expected_version: u64) -> Result<u64, RewardError> {
        let mut ledgers = self.ledgers.lock().expect("lock ledgers");
        let found = ledgers
            .get(&ledger.user_id)
            .map(|entry| entry.version)
            .unwrap_or(0);
        if found != expected_version {
            return Err(RewardError::LedgerVersionMismatch {
                user_id: ledger.user_id.clone(),
                expected: expected_version,
                found,
            });
        }
        let version = expected_version + 1;
        ledgers.insert(
            ledger.user_id.clone(),
            VersionedLedger {
                ledger: ledger.clone(),
                version,
            },
        );
        Ok(version)
    }
}

/// On-disk snapshot representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerSnapshotFile {
    pub format_version: u64,
    pub version: u64,
    pub updated_at_ms: UnixMillis,
    pub ledger: UserLedger,
}

/// File-backed ledger store: one JSON snapshot per user under a root
/// directory, written atomically through a temp file.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    root: PathBuf,
}

impl FileLedgerStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // User ids are opaque strings and may not be filesystem-safe; file
    // names are the sha256 of the id.
    fn ledger_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", sha256_hex(user_id.as_bytes())))
    }

    fn read_snapshot(&self, user_id: &str) -> Result<Option<LedgerSnapshotFile>, RewardError> {
        let path = self.ledger_path(user_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot: LedgerSnapshotFile = serde_json::from_slice(&bytes)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RewardError::SnapshotFormatMismatch {
                expected: SNAPSHOT_FORMAT_VERSION,
                found: snapshot.format_version,
            });
        }
        Ok(Some(snapshot))
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self, user_id: &str) -> Result<Option<VersionedLedger>, RewardError> {
        Ok(self.read_snapshot(user_id)?.map(|snapshot| VersionedLedger {
            ledger: snapshot.ledger,
            version: snapshot.version,
        }))
    }

    fn save(&self, ledger: &UserLedger, expected_version: u64) -> Result<u64, RewardError> {
        let found = self
            .read_snapshot(&ledger.user_id)?
            .map(|snapshot| snapshot.version)
            .unwrap_or(0);
        if found != expected_version {
            return Err(RewardError::LedgerVersionMismatch {
                user_id: ledger.user_id.clone(),
                expected: expected_version,
                found,
            });
        }
        fs::create_dir_all(&self.root)?;
        let version = expected_version + 1;
        let snapshot = LedgerSnapshotFile {
            format_version: SNAPSHOT_FORMAT_VERSION,
            version,
            updated_at_ms: now_ms(),
            ledger: ledger.clone(),
        };
        write_json_atomic(&snapshot, &self.ledger_path(&ledger.user_id))?;
        Ok(version)
    }
}
