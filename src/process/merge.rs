use std::collections::HashMap;
use tracing::debug;

use crate::schema::types::TestKitStockRecord;

/// Stock records reconciled by institution id, in first-insertion order.
#[derive(Debug, Default, Clone)]
pub struct MergedStoreCollection {
    index: HashMap<String, usize>,
    records: Vec<TestKitStockRecord>,
}

impl MergedStoreCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new id, or overwrite every field of the stored record with
    /// `incoming` except `amount`, which keeps the larger of the two.
    pub fn upsert(&mut self, incoming: TestKitStockRecord) {
        match self.index.get(&incoming.id) {
            Some(&pos) => {
                let existing = &mut self.records[pos];
                let amount = existing.amount.max(incoming.amount);
                *existing = TestKitStockRecord {
                    amount,
                    ..incoming
                };
            }
            None => {
                self.index.insert(incoming.id.clone(), self.records.len());
                self.records.push(incoming);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&TestKitStockRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TestKitStockRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TestKitStockRecord> {
        self.records
    }
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub stores: MergedStoreCollection,
    /// Backup records discarded for predating the local day.
    pub stale: usize,
}

/// Keep backup records updated strictly after `day_start` (unix seconds).
pub fn retain_fresh(
    backup: Vec<TestKitStockRecord>,
    day_start: i64,
) -> (Vec<TestKitStockRecord>, usize) {
    let total = backup.len();
    let fresh: Vec<_> = backup
        .into_iter()
        .filter(|s| s.updated_at > day_start)
        .collect();
    let stale = total - fresh.len();
    (fresh, stale)
}

/// Fold fresh backup records first, then the authoritative ones, so the
/// live feed wins every descriptive field while stock never drops below a
/// same-day backup reading.
pub fn merge_stores(
    backup: Vec<TestKitStockRecord>,
    current: Vec<TestKitStockRecord>,
    day_start: i64,
) -> MergeOutcome {
    let (fresh, stale) = retain_fresh(backup, day_start);
    debug!(fresh = fresh.len(), stale, current = current.len(), "merging stores");

    let mut stores = MergedStoreCollection::new();
    for rec in fresh.into_iter().chain(current) {
        stores.upsert(rec);
    }
    MergeOutcome { stores, stale }
}
