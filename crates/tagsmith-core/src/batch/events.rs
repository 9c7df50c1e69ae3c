//! Event broadcasting for run observers.
//!
//! The engine's only observable side effects flow through this channel:
//! per-item state changes, batch-level snapshots, and one terminal event
//! per run. Dropped or lagging receivers never block the engine.

use crate::batch::progress::BatchSnapshot;
use crate::item::ItemStatus;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

/// A per-item state-change report.
#[derive(Debug, Clone, Serialize)]
pub struct ItemUpdate {
    /// The item's stable identifier.
    pub item_id: u64,
    /// Current status.
    pub status: ItemStatus,
    /// Progress within the current attempt, 0-100.
    pub progress: u8,
    /// Short phase label (e.g., "reading", "analyzing", "retrying").
    pub label: String,
    /// Supplementary detail (e.g., "attempt 2", an error excerpt).
    pub sub_label: String,
}

/// Events emitted by the engine during a run.
#[derive(Debug, Clone, Serialize)]
pub enum EngineEvent {
    /// One item's status or progress changed.
    ItemUpdated(ItemUpdate),
    /// Batch-level counts changed.
    BatchProgress {
        /// Current counts by status.
        snapshot: BatchSnapshot,
        /// Human-readable phase label (e.g., "processing 2/5", "paused").
        phase: String,
    },
    /// The run finished normally (items may still have failed individually).
    RunFinished {
        /// Number of items that reached `Done`.
        done: usize,
        /// Total number of items in the batch.
        total: usize,
    },
    /// The run was stopped before completion.
    RunStopped,
}

/// Broadcasts engine events to any number of observers.
pub struct StatusReporter {
    broadcast_tx: broadcast::Sender<EngineEvent>,
}

impl StatusReporter {
    /// Creates a new reporter.
    #[must_use]
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { broadcast_tx }
    }

    /// Subscribes to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Emits a per-item state-change report.
    pub fn emit_item(
        &self,
        item_id: u64,
        status: ItemStatus,
        progress: u8,
        label: &str,
        sub_label: &str,
    ) {
        let event = EngineEvent::ItemUpdated(ItemUpdate {
            item_id,
            status,
            progress,
            label: label.to_string(),
            sub_label: sub_label.to_string(),
        });
        let _ = self.broadcast_tx.send(event);
        debug!(item_id, status = status.as_str(), progress, label, "item update");
    }

    /// Emits a batch-level snapshot with its phase label.
    pub fn emit_batch(&self, snapshot: BatchSnapshot, phase: String) {
        debug!(
            total = snapshot.total,
            done = snapshot.done,
            active = snapshot.active,
            error = snapshot.error,
            phase = %phase,
            "batch progress"
        );
        let _ = self.broadcast_tx.send(EngineEvent::BatchProgress { snapshot, phase });
    }

    /// Emits the normal-completion terminal event.
    pub fn emit_finished(&self, done: usize, total: usize) {
        debug!(done, total, "run finished");
        let _ = self.broadcast_tx.send(EngineEvent::RunFinished { done, total });
    }

    /// Emits the stopped-early terminal event.
    pub fn emit_stopped(&self) {
        debug!("run stopped early");
        let _ = self.broadcast_tx.send(EngineEvent::RunStopped);
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_item_update_reaches_subscriber() {
        let reporter = StatusReporter::new();
        let mut rx = reporter.subscribe();

        reporter.emit_item(7, ItemStatus::Processing, 30, "analyzing", "");
        let event = rx.recv().await.unwrap();
        match event {
            EngineEvent::ItemUpdated(update) => {
                assert_eq!(update.item_id, 7);
                assert_eq!(update.status, ItemStatus::Processing);
                assert_eq!(update.progress, 30);
                assert_eq!(update.label, "analyzing");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_terminal_events() {
        let reporter = StatusReporter::new();
        let mut rx = reporter.subscribe();

        reporter.emit_finished(4, 5);
        assert!(matches!(rx.recv().await.unwrap(), EngineEvent::RunFinished { done: 4, total: 5 }));

        reporter.emit_stopped();
        assert!(matches!(rx.recv().await.unwrap(), EngineEvent::RunStopped));
    }

    #[tokio::test]
    async fn test_batch_event_carries_phase() {
        let reporter = StatusReporter::new();
        let mut rx = reporter.subscribe();

        reporter.emit_batch(BatchSnapshot::default(), "waiting to start".to_string());
        match rx.recv().await.unwrap() {
            EngineEvent::BatchProgress { snapshot, phase } => {
                assert_eq!(snapshot.total, 0);
                assert_eq!(phase, "waiting to start");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_emit_without_subscribers_does_not_block() {
        let reporter = StatusReporter::new();
        reporter.emit_item(1, ItemStatus::Pending, 0, "queued", "");
        reporter.emit_stopped();
    }
}
