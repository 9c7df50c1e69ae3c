//! Derived batch-level progress.
//!
//! Counts are always recomputed from the authoritative per-item statuses,
//! never incrementally maintained, so they can never drift.

use crate::item::{ItemSlot, ItemStatus};
use serde::Serialize;

/// Batch-level counts derived from the item collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSnapshot {
    /// Total number of items.
    pub total: usize,
    /// Items not yet started in this run.
    pub pending: usize,
    /// Items with an attempt in flight.
    pub active: usize,
    /// Items that finished with a result.
    pub done: usize,
    /// Items that finished without a result.
    pub error: usize,
}

impl BatchSnapshot {
    /// Recomputes counts from the item collection.
    #[must_use]
    pub fn from_items(items: &[ItemSlot]) -> Self {
        let mut snapshot = Self { total: items.len(), ..Self::default() };
        for slot in items {
            match slot.lock().expect("item lock poisoned").status {
                ItemStatus::Pending => snapshot.pending += 1,
                ItemStatus::Processing => snapshot.active += 1,
                ItemStatus::Done => snapshot.done += 1,
                ItemStatus::Error => snapshot.error += 1,
            }
        }
        snapshot
    }

    /// Completion percentage: `done / total`, 0 for an empty batch.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.done as f64 / self.total as f64) * 100.0).round() as u8
    }

    /// Whether every item has reached a terminal state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.done + self.error == self.total
    }

    /// Human-readable phase label for display.
    #[must_use]
    pub fn phase_label(&self, paused: bool, stopped: bool) -> String {
        if stopped {
            return "stopped".to_string();
        }
        if paused {
            return "paused".to_string();
        }
        if self.active > 0 {
            return format!("processing {}/{}", self.active, self.total);
        }
        if self.total > 0 && self.done == self.total {
            return "complete".to_string();
        }
        "waiting to start".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::WorkItem;
    use std::path::PathBuf;
    use tagsmith_abstraction::Record;

    fn slots(statuses: &[ItemStatus]) -> Vec<ItemSlot> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut item = WorkItem::new(i as u64, PathBuf::from(format!("{i}.jpg")));
                match status {
                    ItemStatus::Pending => {}
                    ItemStatus::Processing => item.begin_attempt(),
                    ItemStatus::Done => {
                        item.begin_attempt();
                        item.finish_done(Record::new());
                    }
                    ItemStatus::Error => {
                        item.begin_attempt();
                        item.finish_error("failed".to_string());
                    }
                }
                item.into_slot()
            })
            .collect()
    }

    #[test]
    fn test_counts_by_status() {
        let items = slots(&[
            ItemStatus::Pending,
            ItemStatus::Processing,
            ItemStatus::Processing,
            ItemStatus::Done,
            ItemStatus::Error,
        ]);
        let snapshot = BatchSnapshot::from_items(&items);
        assert_eq!(snapshot.total, 5);
        assert_eq!(snapshot.pending, 1);
        assert_eq!(snapshot.active, 2);
        assert_eq!(snapshot.done, 1);
        assert_eq!(snapshot.error, 1);
        assert!(!snapshot.is_settled());
    }

    #[test]
    fn test_empty_batch_percentage_is_zero() {
        let snapshot = BatchSnapshot::from_items(&[]);
        assert_eq!(snapshot.percentage(), 0);
    }

    #[test]
    fn test_percentage_rounds() {
        let items = slots(&[ItemStatus::Done, ItemStatus::Done, ItemStatus::Pending]);
        assert_eq!(BatchSnapshot::from_items(&items).percentage(), 67);
    }

    #[test]
    fn test_phase_labels() {
        let active = slots(&[ItemStatus::Processing, ItemStatus::Pending]);
        let snapshot = BatchSnapshot::from_items(&active);
        assert_eq!(snapshot.phase_label(false, false), "processing 1/2");
        assert_eq!(snapshot.phase_label(true, false), "paused");
        assert_eq!(snapshot.phase_label(false, true), "stopped");

        let complete = slots(&[ItemStatus::Done]);
        assert_eq!(BatchSnapshot::from_items(&complete).phase_label(false, false), "complete");

        assert_eq!(BatchSnapshot::from_items(&[]).phase_label(false, false), "waiting to start");
    }
}
