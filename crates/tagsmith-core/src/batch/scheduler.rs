//! Batch engine: runs items in fixed-size waves with a barrier between
//! waves.
//!
//! Concurrency is bounded by wave width, not by a shared pool. Every item
//! in a wave must reach a terminal state (or the run must stop) before the
//! next wave begins, so a slow item holds back its wave but the bound on
//! in-flight model calls is exact.

use crate::batch::control::RunControl;
use crate::batch::events::{EngineEvent, StatusReporter};
use crate::batch::progress::BatchSnapshot;
use crate::batch::worker::{WorkerContext, process_item};
use crate::config::RunConfig;
use crate::error::Result;
use crate::item::{ItemSlot, ItemStatus, WorkItem};
use crate::naming::OutputNaming;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tagsmith_abstraction::{Record, VisionModel};
use tokio::sync::broadcast;
use tracing::{error, info};

/// How a run ended, with final item counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// `false` when the run was stopped before every item settled.
    pub completed: bool,
    pub done: usize,
    pub total: usize,
}

/// Per-item summary for display after a run.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub id: u64,
    pub file_name: String,
    pub status: ItemStatus,
    pub error: Option<String>,
}

/// Owns a batch of work items and pushes them through a vision model.
///
/// The engine is shared (behind an `Arc`) between the task driving
/// [`BatchEngine::run`] and whatever reacts to user input: pause, resume
/// and stop may be called from any thread at any time.
pub struct BatchEngine {
    items: Arc<Vec<ItemSlot>>,
    control: Arc<RunControl>,
    reporter: Arc<StatusReporter>,
    results: Arc<Mutex<Vec<Record>>>,
    config: RunConfig,
    naming: OutputNaming,
}

impl BatchEngine {
    /// Builds an engine over `sources`, preserving submission order.
    pub fn new(sources: Vec<PathBuf>, config: RunConfig, naming: OutputNaming) -> Result<Self> {
        config.validate()?;
        let items: Vec<ItemSlot> = sources
            .into_iter()
            .enumerate()
            .map(|(id, path)| WorkItem::new(id as u64, path).into_slot())
            .collect();
        Ok(Self {
            items: Arc::new(items),
            control: Arc::new(RunControl::default()),
            reporter: Arc::new(StatusReporter::new()),
            results: Arc::new(Mutex::new(Vec::new())),
            config,
            naming,
        })
    }

    pub fn control(&self) -> Arc<RunControl> {
        Arc::clone(&self.control)
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Requests a permanent stop of the current run.
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.reporter.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot::from_items(&self.items)
    }

    fn emit_batch(&self) {
        let snapshot = self.snapshot();
        let phase = snapshot.phase_label(self.control.is_paused(), self.control.is_stopped());
        self.reporter.emit_batch(snapshot, phase);
    }

    /// All records collected so far, in completion order.
    #[must_use]
    pub fn results(&self) -> Vec<Record> {
        self.results.lock().expect("results lock poisoned").clone()
    }

    /// Per-item status summary, in submission order.
    #[must_use]
    pub fn report(&self) -> Vec<ItemReport> {
        self.items
            .iter()
            .map(|slot| {
                let item = slot.lock().expect("item lock poisoned");
                ItemReport {
                    id: item.id,
                    file_name: item.file_name.clone(),
                    status: item.status,
                    error: item.error.clone(),
                }
            })
            .collect()
    }

    /// Runs the batch to completion or until stopped.
    ///
    /// Items already `Done` from a previous run keep their results and are
    /// skipped; everything else is reset and processed again. Item
    /// failures do not fail the run, so the returned error covers only
    /// engine misuse, never model behavior.
    pub async fn run(&self, model: Arc<dyn VisionModel>) -> Result<RunOutcome> {
        self.control.reset_for_run();
        {
            let mut results = self.results.lock().expect("results lock poisoned");
            results.clear();
        }
        for slot in self.items.iter() {
            let mut item = slot.lock().expect("item lock poisoned");
            if item.status == ItemStatus::Done {
                if let Some(record) = item.result.clone() {
                    self.results.lock().expect("results lock poisoned").push(record);
                }
            } else {
                item.reset_for_run();
            }
        }
        let total = self.items.len();
        info!(total, concurrency = self.config.concurrency, "starting batch run");
        self.emit_batch();

        let policy = self.config.retry_policy();
        for wave_start in (0..total).step_by(self.config.concurrency) {
            if self.control.is_stopped() {
                break;
            }
            if !self.control.wait_while_paused().await {
                break;
            }

            let wave_end = (wave_start + self.config.concurrency).min(total);
            let mut handles = Vec::new();
            for index in wave_start..wave_end {
                let slot = Arc::clone(&self.items[index]);
                {
                    let item = slot.lock().expect("item lock poisoned");
                    if item.status == ItemStatus::Done {
                        continue;
                    }
                }
                let ctx = WorkerContext {
                    slot,
                    index,
                    items: Arc::clone(&self.items),
                    model: Arc::clone(&model),
                    policy,
                    control: Arc::clone(&self.control),
                    reporter: Arc::clone(&self.reporter),
                    results: Arc::clone(&self.results),
                    naming: self.naming.clone(),
                };
                handles.push(tokio::spawn(process_item(ctx)));
            }

            // Wave barrier: nothing from the next wave starts until every
            // task here has returned.
            for handle in handles {
                if let Err(e) = handle.await {
                    error!(error = %e, "item task panicked");
                }
            }
        }

        if self.control.is_stopped() {
            self.finalize_stopped();
            let snapshot = self.snapshot();
            info!(done = snapshot.done, total, "run stopped");
            Ok(RunOutcome { completed: false, done: snapshot.done, total })
        } else {
            let snapshot = self.snapshot();
            self.emit_batch();
            self.reporter.emit_finished(snapshot.done, total);
            info!(done = snapshot.done, errors = snapshot.error, total, "run complete");
            Ok(RunOutcome { completed: true, done: snapshot.done, total })
        }
    }

    /// After a stop, every item that never settled becomes an error so the
    /// batch ends in a fully terminal state.
    fn finalize_stopped(&self) {
        for slot in self.items.iter() {
            let mut item = slot.lock().expect("item lock poisoned");
            if matches!(item.status, ItemStatus::Pending | ItemStatus::Processing) {
                item.finish_error("stopped before processing completed".to_string());
                let id = item.id;
                drop(item);
                self.reporter.emit_item(id, ItemStatus::Error, 100, "stopped", "");
            }
        }
        self.emit_batch();
        self.reporter.emit_stopped();
    }
}
