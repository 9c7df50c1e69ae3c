//! Batch execution: control flags, retry policy, events, progress, and the
//! wave-barrier scheduler.

pub mod control;
pub mod events;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub(crate) mod worker;
