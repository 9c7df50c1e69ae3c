//! Item processor: drives one work item through its attempt sequence.
//!
//! Per attempt: check pause/stop, acquire the encoded payload, invoke the
//! vision model, then either finalize the item or consult the retry policy.
//! Failures never propagate upward; they end on the item and in the event
//! channel.

use crate::batch::control::RunControl;
use crate::batch::events::StatusReporter;
use crate::batch::progress::BatchSnapshot;
use crate::batch::retry::RetryPolicy;
use crate::item::{ItemSlot, ItemStatus};
use crate::naming::OutputNaming;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tagsmith_abstraction::{EncodedImage, ProgressFn, Record, VisionModel};
use tracing::{debug, error, info, warn};

/// Everything one processor needs to drive its assigned item.
pub(crate) struct WorkerContext {
    pub slot: ItemSlot,
    pub index: usize,
    pub items: Arc<Vec<ItemSlot>>,
    pub model: Arc<dyn VisionModel>,
    pub policy: RetryPolicy,
    pub control: Arc<RunControl>,
    pub reporter: Arc<StatusReporter>,
    pub results: Arc<Mutex<Vec<Record>>>,
    pub naming: OutputNaming,
}

impl WorkerContext {
    fn emit_batch(&self) {
        let snapshot = BatchSnapshot::from_items(&self.items);
        let phase = snapshot.phase_label(self.control.is_paused(), self.control.is_stopped());
        self.reporter.emit_batch(snapshot, phase);
    }

    /// Advances the item's progress within the current attempt and reports
    /// it. Progress never moves backwards within an attempt, and an item
    /// that is no longer `Processing` is left untouched.
    fn set_progress(&self, progress: u8, label: &str, sub_label: &str) {
        let item_id = {
            let mut item = self.slot.lock().expect("item lock poisoned");
            if item.status != ItemStatus::Processing {
                return;
            }
            item.progress = item.progress.max(progress);
            item.id
        };
        self.reporter.emit_item(item_id, ItemStatus::Processing, progress, label, sub_label);
    }
}

/// Maps an adapter's own 0-100 progress into the 30-90 span of the item's
/// progress bar (reading the payload owns 0-30, finalization 90-100).
fn scale_adapter_progress(percent: u8) -> u8 {
    30 + (u16::from(percent.min(100)) * 6 / 10) as u8
}

fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Drives one item to a terminal state, or returns early on stop.
pub(crate) async fn process_item(ctx: WorkerContext) {
    let (item_id, source, file_name) = {
        let item = ctx.slot.lock().expect("item lock poisoned");
        (item.id, item.source.clone(), item.file_name.clone())
    };

    for attempt in 0..ctx.policy.total_attempts() {
        if ctx.control.is_stopped() {
            return;
        }
        if !ctx.control.wait_while_paused().await {
            return;
        }

        {
            let mut item = ctx.slot.lock().expect("item lock poisoned");
            item.begin_attempt();
        }
        ctx.reporter.emit_item(item_id, ItemStatus::Processing, 0, "starting", "");
        ctx.emit_batch();

        match run_attempt(&ctx, &source, &file_name).await {
            Ok(record) => {
                apply_success(&ctx, item_id, &file_name, record);
                return;
            }
            Err(message) => {
                if ctx.control.is_stopped() {
                    return;
                }
                if ctx.policy.should_retry(attempt) {
                    warn!(
                        item = %file_name,
                        attempt = attempt + 1,
                        max_retries = ctx.policy.max_retries(),
                        error = %message,
                        "attempt failed, retrying"
                    );
                    ctx.set_progress(50, "retrying", &format!("attempt {}", attempt + 2));
                    if !ctx.control.interruptible_delay(ctx.policy.delay()).await {
                        return;
                    }
                } else {
                    error!(item = %file_name, error = %message, "retry budget exhausted");
                    {
                        let mut item = ctx.slot.lock().expect("item lock poisoned");
                        item.finish_error(message.clone());
                    }
                    let excerpt: String = message.chars().take(60).collect();
                    ctx.reporter.emit_item(item_id, ItemStatus::Error, 100, "failed", &excerpt);
                    ctx.emit_batch();
                    return;
                }
            }
        }
    }
}

/// One attempt: read and encode the payload, then call the model.
/// Any failure comes back as a plain description; the engine treats
/// transport-level and content-level failures uniformly.
async fn run_attempt(
    ctx: &WorkerContext,
    source: &Path,
    file_name: &str,
) -> Result<Record, String> {
    ctx.set_progress(10, "reading", "loading image");
    let bytes = tokio::fs::read(source)
        .await
        .map_err(|e| format!("failed to read {}: {}", file_name, e))?;
    let image = EncodedImage::new(mime_type_for(source), STANDARD.encode(&bytes));

    if ctx.control.is_stopped() {
        return Err("stopped".to_string());
    }
    ctx.set_progress(30, "analyzing", "sending to model");

    let on_progress: ProgressFn = {
        let reporter = Arc::clone(&ctx.reporter);
        let slot = Arc::clone(&ctx.slot);
        Arc::new(move |percent, label| {
            let scaled = scale_adapter_progress(percent);
            let item_id = {
                let mut item = slot.lock().expect("item lock poisoned");
                if item.status != ItemStatus::Processing {
                    return;
                }
                item.progress = item.progress.max(scaled);
                item.id
            };
            reporter.emit_item(item_id, ItemStatus::Processing, scaled, "analyzing", label);
        })
    };

    ctx.model.analyze(&image, on_progress).await.map_err(|e| e.to_string())
}

/// Finalizes a successful attempt, unless the run stopped in the meantime.
///
/// A result arriving after the item was already finalized (the stop handler
/// marked it `Error`) is discarded: a stopped item must never be
/// overwritten by a late success.
fn apply_success(ctx: &WorkerContext, item_id: u64, file_name: &str, record: Record) {
    if ctx.control.is_stopped() {
        debug!(item = %file_name, "discarding result that arrived after stop");
        return;
    }
    ctx.set_progress(95, "finalizing", "");

    let final_record = {
        let mut item = ctx.slot.lock().expect("item lock poisoned");
        if item.status != ItemStatus::Processing {
            debug!(item = %file_name, "item already finalized, discarding result");
            return;
        }
        let mut record = record;
        ctx.naming.merge_into(&mut record, &item.file_name, ctx.index);
        item.finish_done(record.clone());
        record
    };

    ctx.results.lock().expect("results lock poisoned").push(final_record);
    info!(item = %file_name, "item complete");
    ctx.reporter.emit_item(item_id, ItemStatus::Done, 100, "complete", "");
    ctx.emit_batch();
}
