//! Work item model and lifecycle state.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tagsmith_abstraction::Record;

/// Lifecycle state of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet started in this run.
    Pending,
    /// An attempt is in flight.
    Processing,
    /// Finished with a result. Terminal: never re-processed unless reset.
    Done,
    /// Finished without a result. Terminal for this run.
    Error,
}

impl ItemStatus {
    /// Stable lowercase name for display and events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Whether no further processing occurs for this status in the current run.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// One unit of work: a single source image and its lifecycle state.
///
/// Exactly one of `result`/`error` is populated once the status leaves
/// `Pending`/`Processing`. Only the processor that owns an item for the
/// current wave mutates it, apart from the scheduler's reset and stop
/// finalization steps, which never run concurrently with active waves.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Unique, stable identifier; assigned in submission order.
    pub id: u64,
    /// Path to the source image. Opaque to the engine apart from reading it.
    pub source: PathBuf,
    /// Original file name, used for display and naming.
    pub file_name: String,
    /// Current lifecycle state.
    pub status: ItemStatus,
    /// Progress within the current attempt, 0-100.
    pub progress: u8,
    /// The structured record, set exactly once on transition to `Done`.
    pub result: Option<Record>,
    /// Last failure description, set on transition to `Error`.
    pub error: Option<String>,
    /// Attempts performed in the current run.
    pub attempts: u32,
}

/// Shared handle to a work item. One owner per item per wave; every other
/// access is a short read under the lock.
pub type ItemSlot = Arc<Mutex<WorkItem>>;

impl WorkItem {
    /// Creates a new pending item for the given source path.
    #[must_use]
    pub fn new(id: u64, source: PathBuf) -> Self {
        let file_name = source
            .file_name()
            .map_or_else(|| format!("item-{id}"), |n| n.to_string_lossy().into_owned());
        Self {
            id,
            source,
            file_name,
            status: ItemStatus::Pending,
            progress: 0,
            result: None,
            error: None,
            attempts: 0,
        }
    }

    /// Wraps the item in a shared slot.
    #[must_use]
    pub fn into_slot(self) -> ItemSlot {
        Arc::new(Mutex::new(self))
    }

    /// Resets the item for a new run unless it is already `Done`.
    ///
    /// `Done` items are skipped so a restarted batch only re-processes what
    /// did not complete. Resetting an already-pending item is a no-op.
    pub fn reset_for_run(&mut self) {
        if self.status == ItemStatus::Done {
            return;
        }
        self.status = ItemStatus::Pending;
        self.progress = 0;
        self.error = None;
        self.attempts = 0;
    }

    /// Marks the start of a new attempt.
    pub fn begin_attempt(&mut self) {
        self.status = ItemStatus::Processing;
        self.progress = 0;
        self.attempts += 1;
    }

    /// Finalizes the item with a result.
    pub fn finish_done(&mut self, record: Record) {
        self.status = ItemStatus::Done;
        self.progress = 100;
        self.result = Some(record);
        self.error = None;
    }

    /// Finalizes the item with a failure description.
    pub fn finish_error(&mut self, message: String) {
        self.status = ItemStatus::Error;
        self.result = None;
        self.error = Some(message);
    }

}
