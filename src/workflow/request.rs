use super::policy::DeletionPolicy;
use super::record::{DeletionRecord, DeletionStatus, MailKind};
use crate::calendar::Interval;
use crate::core::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-submitted change to a record's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub end_date: DateTime<Utc>,
    pub schedule_enabled: bool,
}

impl UpdateRequest {
    pub fn new(end_date: DateTime<Utc>) -> Self {
        Self {
            end_date,
            schedule_enabled: true,
        }
    }

    pub fn disable(end_date: DateTime<Utc>) -> Self {
        Self {
            end_date,
            schedule_enabled: false,
        }
    }

    /// Request that mirrors the record as it stands, the way a form is
    /// pre-filled before the user edits it.
    pub fn from_record(record: &DeletionRecord) -> Self {
        Self {
            end_date: record.end_date,
            schedule_enabled: record.status != DeletionStatus::NotScheduled,
        }
    }
}

/// Result of reconciling an [`UpdateRequest`] with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The record as it should be stored.
    pub record: DeletionRecord,
    /// Set when the requested date was rejected or clamped; the date the user
    /// should be shown instead.
    pub minimum_date_forced: Option<DateTime<Utc>>,
    pub trigger_mail: Option<MailKind>,
}

impl UpdateOutcome {
    fn accepted(record: DeletionRecord, trigger_mail: Option<MailKind>) -> Self {
        Self {
            record,
            minimum_date_forced: None,
            trigger_mail,
        }
    }

    fn rejected(record: DeletionRecord, minimum: DateTime<Utc>) -> Self {
        Self {
            record,
            minimum_date_forced: Some(minimum),
            trigger_mail: None,
        }
    }
}

impl DeletionPolicy {
    /// Apply a user-requested schedule change to `current`.
    ///
    /// Minimum dates are clamped one day past the lead-time threshold so the
    /// sweep never fires on the day the user edited the date.
    pub fn reconcile_request(
        &self,
        current: &DeletionRecord,
        request: &UpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        if !request.schedule_enabled {
            let record = current.advanced(DeletionStatus::NotScheduled, request.end_date);
            return Ok(UpdateOutcome::accepted(record, None));
        }

        if current.status != DeletionStatus::NotScheduled && request.end_date == current.end_date {
            return Ok(UpdateOutcome::accepted(current.clone(), None));
        }

        match current.status {
            DeletionStatus::NotScheduled | DeletionStatus::Scheduled => {
                self.reschedule(current, request.end_date, now)
            }
            DeletionStatus::ScheduledNotified => self.reconcile_notified(current, request.end_date, now),
            DeletionStatus::StagedForDeletion => {
                if request.end_date >= current.end_date {
                    let record = current.advanced(DeletionStatus::StagedForDeletion, request.end_date);
                    Ok(UpdateOutcome::accepted(record, Some(MailKind::WillBeDeletedSoon)))
                } else {
                    Ok(UpdateOutcome::rejected(current.clone(), current.end_date))
                }
            }
        }
    }

    /// Phase-1 rule: the notification must still be at least one full
    /// staging interval away.
    fn reschedule(
        &self,
        current: &DeletionRecord,
        requested: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        let until_staging = self.interval_until_staging();
        let notify_by = self.calendar().shift(requested, until_staging.negate())?;

        if notify_by < now {
            let earliest = self.calendar().midnight(until_staging, now)?;
            let forced = self.calendar().shift(earliest, Interval::days(1))?;
            let record = current.advanced(DeletionStatus::Scheduled, forced);
            return Ok(UpdateOutcome::rejected(record, forced));
        }

        let record = current.advanced(DeletionStatus::Scheduled, requested);
        Ok(UpdateOutcome::accepted(record, None))
    }

    fn reconcile_notified(
        &self,
        current: &DeletionRecord,
        requested: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        let deadline = self.date_staged_for_deletion(current.end_date)?;

        if requested <= deadline {
            let minimum = self.calendar().shift(deadline, Interval::days(1))?;
            return Ok(UpdateOutcome::rejected(current.clone(), minimum));
        }

        let renotify_from = self.calendar().shift(deadline, self.renotify_after())?;
        if requested < renotify_from {
            let record = current.advanced(DeletionStatus::ScheduledNotified, requested);
            return Ok(UpdateOutcome::accepted(
                record,
                Some(MailKind::WillBeStagedForDeletion),
            ));
        }

        self.reschedule(current, requested, now)
    }
}
