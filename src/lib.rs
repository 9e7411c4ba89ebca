// ============================================================================
// Staged Deletion Library
// ============================================================================

pub mod calendar;
pub mod config;
pub mod core;
pub mod facade;
pub mod interface;
pub mod storage;
pub mod sweep;
pub mod workflow;

// Re-export main types for convenience
pub use calendar::{Calendar, Clock, Interval, ManualClock, SystemClock};
pub use config::WorkflowConfig;
pub use core::{DeletionError, Result};
pub use facade::DeletionWorkflow;
pub use interface::{Notifier, RecordStore, ResourceLifecycle};
pub use storage::{InMemoryRecordStore, InMemoryResources, Location, MailOutbox};
pub use sweep::{SweepFailure, SweepReport, SweepWorker, spawn_sweep_worker};
pub use workflow::{
    DeletionPolicy, DeletionRecord, DeletionStatus, DeletionTimeline, ExternalFacts, MailKind,
    ResourceId, Transition, UpdateOutcome, UpdateRequest,
};

use std::sync::Arc;

// ============================================================================
// In-memory wiring
// ============================================================================

/// A [`DeletionWorkflow`] wired to in-memory collaborators, with handles to
/// each of them.
///
/// Useful for tests and for exploring a configuration before plugging in the
/// real platform.
///
/// # Examples
///
/// ```
/// use staged_deletion::{InMemoryWorkflow, WorkflowConfig};
///
/// # #[tokio::main]
/// # async fn main() -> staged_deletion::Result<()> {
/// let harness = InMemoryWorkflow::new(&WorkflowConfig::default())?;
/// let id = harness.resources.create("Intro to Rust").await;
/// let record = harness.workflow.register_resource(id).await?;
/// println!("{} will be reviewed on {}", id, record.end_date);
///
/// let report = harness.workflow.sweep().await?;
/// assert_eq!(report.transitions(), 0);
/// # Ok(())
/// # }
/// ```
pub struct InMemoryWorkflow {
    pub workflow: Arc<DeletionWorkflow>,
    pub store: Arc<InMemoryRecordStore>,
    pub resources: Arc<InMemoryResources>,
    pub outbox: Arc<MailOutbox>,
    pub clock: Arc<ManualClock>,
}

impl InMemoryWorkflow {
    /// Wire up with the clock starting at the current wall-clock time.
    pub fn new(config: &WorkflowConfig) -> Result<Self> {
        Self::starting_at(config, SystemClock.now())
    }

    pub fn starting_at(config: &WorkflowConfig, start: chrono::DateTime<chrono::Utc>) -> Result<Self> {
        let policy = config.policy()?;
        let store = Arc::new(InMemoryRecordStore::new());
        let resources = Arc::new(InMemoryResources::new(config.staging_area.clone()));
        let outbox = Arc::new(MailOutbox::new());
        let clock = Arc::new(ManualClock::new(start));

        let workflow = Arc::new(DeletionWorkflow::new(
            policy,
            store.clone(),
            resources.clone(),
            outbox.clone(),
            clock.clone(),
        ));

        Ok(Self {
            workflow,
            store,
            resources,
            outbox,
            clock,
        })
    }
}
