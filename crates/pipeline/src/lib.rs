//! Clip-extraction job lifecycle.
//!
//! [`JobLifecycle`] dispatches a project's source video to the clip vendor,
//! polls the external job, and materializes finished clips into the
//! project's clip folder. All project writes go through a [`ProjectStore`],
//! which applies each edit under a row lock so dispatch and
//! materialization stay single-shot under concurrent callers.

pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod poller;
pub mod store;
pub mod sweep;

pub use error::PipelineError;
pub use lifecycle::{JobLifecycle, SyncOutcome};
pub use memory::MemoryProjectStore;
pub use store::{LifecycleEdit, PgProjectStore, ProjectStore};
pub use sweep::SweepSummary;
