use super::record::{DeletionRecord, DeletionStatus, ResourceId};
use crate::calendar::{Calendar, Interval};
use crate::core::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lead times and switches that drive the deletion workflow.
///
/// Every decision the workflow makes is a pure function of a policy, a
/// record, the current time and (for staged records) whether the resource is
/// still in the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPolicy {
    calendar: Calendar,
    interval_until_staging: Interval,
    interval_before_deletion: Interval,
    default_lead_time: Interval,
    renotify_after: Option<Interval>,
    auto_delete_enabled: bool,
}

impl DeletionPolicy {
    pub fn new(
        calendar: Calendar,
        interval_until_staging: Interval,
        interval_before_deletion: Interval,
        default_lead_time: Interval,
    ) -> Self {
        Self {
            calendar,
            interval_until_staging,
            interval_before_deletion,
            default_lead_time,
            renotify_after: None,
            auto_delete_enabled: true,
        }
    }

    pub fn with_auto_delete(mut self, enabled: bool) -> Self {
        self.auto_delete_enabled = enabled;
        self
    }

    /// Override how far past the staging deadline a requested date must be
    /// before a notified record drops back to phase 1.
    pub fn with_renotify_after(mut self, threshold: Interval) -> Self {
        self.renotify_after = Some(threshold);
        self
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn interval_until_staging(&self) -> Interval {
        self.interval_until_staging
    }

    pub fn interval_before_deletion(&self) -> Interval {
        self.interval_before_deletion
    }

    pub fn default_lead_time(&self) -> Interval {
        self.default_lead_time
    }

    pub fn renotify_after(&self) -> Interval {
        self.renotify_after.unwrap_or(self.interval_until_staging)
    }

    pub fn auto_delete_enabled(&self) -> bool {
        self.auto_delete_enabled
    }

    /// `end_date` given to a freshly registered resource.
    pub fn default_end_date(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.calendar.midnight(self.default_lead_time, now)
    }

    /// Record created when a resource enters the workflow.
    pub fn initial_record(&self, resource_id: ResourceId, now: DateTime<Utc>) -> Result<DeletionRecord> {
        Ok(DeletionRecord::new(
            resource_id,
            self.default_end_date(now)?,
            DeletionStatus::Scheduled,
        ))
    }

    /// Day on which a notified record with this `end_date` moves to the
    /// staging area.
    pub fn date_staged_for_deletion(&self, end_date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.calendar.start_of_day(end_date)
    }

    /// Projected dates for `record`, assuming the sweep runs every day.
    pub fn timeline(&self, record: &DeletionRecord) -> Result<DeletionTimeline> {
        let calendar = &self.calendar;
        let timeline = match record.status {
            DeletionStatus::NotScheduled => DeletionTimeline::default(),
            DeletionStatus::Scheduled => {
                let staging = calendar.midnight(self.interval_until_staging, record.end_date)?;
                DeletionTimeline {
                    notification: Some(record.end_date),
                    staging: Some(staging),
                    deletion: Some(calendar.shift(staging, self.interval_before_deletion)?),
                }
            }
            DeletionStatus::ScheduledNotified => {
                let staging = self.date_staged_for_deletion(record.end_date)?;
                DeletionTimeline {
                    notification: None,
                    staging: Some(staging),
                    deletion: Some(calendar.shift(staging, self.interval_before_deletion)?),
                }
            }
            DeletionStatus::StagedForDeletion => DeletionTimeline {
                notification: None,
                staging: None,
                deletion: Some(record.end_date),
            },
        };
        Ok(timeline)
    }
}

impl Default for DeletionPolicy {
    fn default() -> Self {
        Self::new(
            Calendar::utc(),
            Interval::weeks(3),
            Interval::months(1),
            Interval::years(1),
        )
    }
}

/// Upcoming phase boundaries of a record. Phases already passed are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionTimeline {
    pub notification: Option<DateTime<Utc>>,
    pub staging: Option<DateTime<Utc>>,
    pub deletion: Option<DateTime<Utc>>,
}
