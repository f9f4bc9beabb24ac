//! Scenario tests for the reward engine.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::engine::RewardEngine;
use crate::rules::{RewardRule, RuleTable};
use crate::store::MemoryLedgerStore;
use crate::types::UnixMillis;


pub(super) const T0: UnixMillis = 1_709_596_800_000; // 2024-03-05T00:00:00Z

pub(super) fn engine_with_rules(
    rules: Vec<RewardRule>,
    clock: Arc<AtomicI64>,
) -> RewardEngine {
    let table = RuleTable::from_rules(rules).expect("valid table");
    let now_fn = {
        let clock = clock.clone();
        Arc::new(move || clock.load(Ordering::SeqCst))
    };
    RewardEngine::new_with_clock(table, Arc::new(MemoryLedgerStore::new()), now_fn)
}
