//! Batch execution engine for tagsmith.
//!
//! This crate turns a static list of images into a live, controllable,
//! bounded-concurrency pipeline: items are processed in concurrency-sized
//! waves, each item gets its own retry budget, and the whole run can be
//! paused, resumed, or stopped cooperatively at any time. Observers follow
//! along through a broadcast event channel; the engine itself renders
//! nothing and never interprets the records the model returns.

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod item;
pub mod naming;

pub use batch::control::RunControl;
pub use batch::events::{EngineEvent, ItemUpdate, StatusReporter};
pub use batch::progress::BatchSnapshot;
pub use batch::retry::RetryPolicy;
pub use batch::scheduler::{BatchEngine, ItemReport, RunOutcome};
pub use config::RunConfig;
pub use error::EngineError;
pub use item::{ItemStatus, WorkItem};
pub use naming::{NamingRule, OutputNaming};
pub use tagsmith_abstraction::Record;
