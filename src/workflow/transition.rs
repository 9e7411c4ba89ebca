use super::policy::DeletionPolicy;
use super::record::{DeletionRecord, DeletionStatus, MailKind};
use crate::core::Result;
use chrono::{DateTime, Utc};

/// Facts about the outside world the engine cannot derive from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalFacts {
    /// Only consulted for [`DeletionStatus::StagedForDeletion`] records.
    pub in_staging_area: bool,
}

impl ExternalFacts {
    pub fn in_staging_area(in_staging_area: bool) -> Self {
        Self { in_staging_area }
    }
}

/// What the sweep must do for one record.
///
/// A failed side effect leaves the stored record as it was before the
/// transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing is due.
    Hold,
    /// Store `record`, then send `mail` (phase 1 -> 2).
    Notify { record: DeletionRecord, mail: MailKind },
    /// Move the resource to the staging area, then store `record` (phase 2 -> 3).
    Stage { record: DeletionRecord },
    /// Delete the record, then the resource.
    Delete,
    /// The resource left the staging area behind the workflow's back; store
    /// `record` to restart at phase 1.
    Restore { record: DeletionRecord },
    /// Deletion is due but auto-delete is switched off.
    AwaitingManualDeletion,
}

impl Transition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Notify { .. } => "notify",
            Self::Stage { .. } => "stage",
            Self::Delete => "delete",
            Self::Restore { .. } => "restore",
            Self::AwaitingManualDeletion => "awaiting_manual_deletion",
        }
    }

    /// Record that replaces the current one, if any.
    pub fn next_record(&self) -> Option<&DeletionRecord> {
        match self {
            Self::Notify { record, .. } | Self::Stage { record } | Self::Restore { record } => Some(record),
            Self::Hold | Self::Delete | Self::AwaitingManualDeletion => None,
        }
    }
}

impl DeletionPolicy {
    /// Decide the next step for `record` at `now`.
    ///
    /// Advances at most one phase. The next phase always gets its full lead
    /// time counted from `now`, however late the call is.
    pub fn evaluate(
        &self,
        record: &DeletionRecord,
        now: DateTime<Utc>,
        facts: ExternalFacts,
    ) -> Result<Transition> {
        let transition = match record.status {
            DeletionStatus::NotScheduled => Transition::Hold,
            DeletionStatus::Scheduled if record.is_due(now) => Transition::Notify {
                record: record.advanced(
                    DeletionStatus::ScheduledNotified,
                    self.calendar().midnight(self.interval_until_staging(), now)?,
                ),
                mail: MailKind::WillBeStagedForDeletion,
            },
            DeletionStatus::Scheduled => Transition::Hold,
            DeletionStatus::ScheduledNotified if record.is_due(now) => Transition::Stage {
                record: record.advanced(
                    DeletionStatus::StagedForDeletion,
                    self.calendar().midnight(self.interval_before_deletion(), now)?,
                ),
            },
            DeletionStatus::ScheduledNotified => Transition::Hold,
            DeletionStatus::StagedForDeletion if !facts.in_staging_area => Transition::Restore {
                record: record.advanced(DeletionStatus::Scheduled, self.default_end_date(now)?),
            },
            DeletionStatus::StagedForDeletion if record.is_due(now) => {
                if self.auto_delete_enabled() {
                    Transition::Delete
                } else {
                    Transition::AwaitingManualDeletion
                }
            }
            DeletionStatus::StagedForDeletion => Transition::Hold,
        };
        Ok(transition)
    }
}
