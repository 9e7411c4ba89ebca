//! Deletion lifecycle engine.
//!
//! Pure decisions only: the functions here take a record, the current time
//! and a few external facts, and return what should happen. Applying the
//! result is left to [`crate::facade::DeletionWorkflow`].

pub mod policy;
pub mod record;
pub mod request;
pub mod transition;

pub use policy::{DeletionPolicy, DeletionTimeline};
pub use record::{DeletionRecord, DeletionStatus, MailKind, ResourceId};
pub use request::{UpdateOutcome, UpdateRequest};
pub use transition::{ExternalFacts, Transition};
