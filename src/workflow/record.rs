use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a resource is in its deletion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    /// Scheduling was switched off; nothing happens until a user re-enables it.
    NotScheduled,
    /// Phase 1: queued for deletion, no notification sent yet.
    Scheduled,
    /// Phase 2: owners were told the resource is about to be staged.
    ScheduledNotified,
    /// Phase 3: the resource sits in the staging area awaiting deletion.
    StagedForDeletion,
}

impl DeletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotScheduled => "not_scheduled",
            Self::Scheduled => "scheduled",
            Self::ScheduledNotified => "scheduled_notified",
            Self::StagedForDeletion => "staged_for_deletion",
        }
    }
}

impl fmt::Display for DeletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DeletionStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "not_scheduled" | "0" => Ok(Self::NotScheduled),
            "scheduled" | "1" => Ok(Self::Scheduled),
            "scheduled_notified" | "notified" | "2" => Ok(Self::ScheduledNotified),
            "staged_for_deletion" | "staged" | "3" => Ok(Self::StagedForDeletion),
            other => Err(format!("unknown deletion status '{}'", other)),
        }
    }
}

/// Notifications the workflow can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    WillBeStagedForDeletion,
    WillBeDeletedSoon,
}

impl MailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WillBeStagedForDeletion => "mail_will_be_staged_for_deletion",
            Self::WillBeDeletedSoon => "mail_will_be_deleted_soon",
        }
    }
}

impl fmt::Display for MailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Deletion state of one resource.
///
/// `end_date` is the boundary at which the current phase ends. While
/// [`DeletionStatus::StagedForDeletion`] it is the day of final deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRecord {
    pub resource_id: ResourceId,
    pub end_date: DateTime<Utc>,
    pub status: DeletionStatus,
}

impl DeletionRecord {
    pub fn new(resource_id: ResourceId, end_date: DateTime<Utc>, status: DeletionStatus) -> Self {
        Self {
            resource_id,
            end_date,
            status,
        }
    }

    /// Copy of this record moved to `status` with a new boundary.
    pub fn advanced(&self, status: DeletionStatus, end_date: DateTime<Utc>) -> Self {
        Self {
            resource_id: self.resource_id,
            end_date,
            status,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }
}
