//! Periodic reconciliation of every deletion record.

pub mod worker;

pub use worker::{SweepWorker, spawn_sweep_worker};

use crate::core::{DeletionError, Result};
use crate::facade::DeletionWorkflow;
use crate::workflow::{DeletionRecord, DeletionStatus, ExternalFacts, ResourceId, Transition};
use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// A record the sweep could not process.
#[derive(Debug)]
pub struct SweepFailure {
    pub resource_id: ResourceId,
    pub error: DeletionError,
}

/// Tally of one sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub examined: usize,
    pub notified: usize,
    pub staged: usize,
    pub deleted: usize,
    pub restored: usize,
    pub awaiting_manual_deletion: usize,
    /// Records that vanished between listing and processing.
    pub skipped: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Number of records that changed phase or were deleted.
    pub fn transitions(&self) -> usize {
        self.notified + self.staged + self.deleted + self.restored
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn tally(&mut self, transition: &Transition) {
        match transition {
            Transition::Hold => {}
            Transition::Notify { .. } => self.notified += 1,
            Transition::Stage { .. } => self.staged += 1,
            Transition::Delete => self.deleted += 1,
            Transition::Restore { .. } => self.restored += 1,
            Transition::AwaitingManualDeletion => self.awaiting_manual_deletion += 1,
        }
    }
}

impl DeletionWorkflow {
    /// Run one sweep at the clock's current time.
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(self.now()).await
    }

    /// Advance every record that is due at `now` by at most one phase.
    ///
    /// Only a failure to list the records fails the sweep as a whole; any
    /// other error is recorded against its resource and the sweep moves on.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let span = info_span!("sweep.run", now = %now.to_rfc3339());
        async move {
            let resource_ids: Vec<ResourceId> = self
                .store
                .list_all()
                .await?
                .into_iter()
                .map(|record| record.resource_id)
                .collect();

            let mut report = SweepReport::default();
            for resource_id in resource_ids {
                report.examined += 1;
                match self.reconcile_record(resource_id, now).await {
                    Ok(Some(transition)) => report.tally(&transition),
                    Ok(None) => {
                        debug!(resource_id = %resource_id, "record disappeared before processing");
                        report.skipped += 1;
                    }
                    Err(err) => {
                        error!(resource_id = %resource_id, error = %err, "failed to reconcile record");
                        report.failures.push(SweepFailure {
                            resource_id,
                            error: err,
                        });
                    }
                }
            }

            info!(
                examined = report.examined,
                notified = report.notified,
                staged = report.staged,
                deleted = report.deleted,
                restored = report.restored,
                failures = report.failures.len(),
                "sweep finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn reconcile_record(
        &self,
        resource_id: ResourceId,
        now: DateTime<Utc>,
    ) -> Result<Option<Transition>> {
        let span = info_span!("sweep.record", resource_id = %resource_id);
        async move {
            let Some(record) = self.store.get(resource_id).await? else {
                return Ok(None);
            };

            let facts = match record.status {
                DeletionStatus::StagedForDeletion => {
                    ExternalFacts::in_staging_area(self.resources.is_in_staging_area(resource_id).await?)
                }
                _ => ExternalFacts::in_staging_area(false),
            };

            let transition = self.policy.evaluate(&record, now, facts)?;
            self.apply_transition(&record, &transition).await?;
            Ok(Some(transition))
        }
        .instrument(span)
        .await
    }

    async fn apply_transition(&self, current: &DeletionRecord, transition: &Transition) -> Result<()> {
        let resource_id = current.resource_id;
        let calendar = self.policy.calendar();

        match transition {
            Transition::Hold => {}
            Transition::Notify { record, mail } => {
                self.store.upsert(record.clone()).await?;
                if let Err(err) = self.notifier.send(*mail, resource_id).await {
                    self.rollback(current).await;
                    return Err(err);
                }
                info!(
                    staging_on = %calendar.format_date(record.end_date),
                    "owners notified of upcoming staging"
                );
            }
            Transition::Stage { record } => {
                if !self.resources.move_to_staging_area(resource_id).await? {
                    return Err(DeletionError::StagingMoveFailed(resource_id));
                }
                self.store.upsert(record.clone()).await?;
                info!(
                    deletion_on = %calendar.format_date(record.end_date),
                    "resource moved to staging area"
                );
            }
            Transition::Delete => {
                self.store.delete(resource_id).await?;
                if let Err(err) = self.resources.delete_resource(resource_id).await {
                    self.rollback(current).await;
                    return Err(err);
                }
                info!("resource deleted");
            }
            Transition::Restore { record } => {
                self.store.upsert(record.clone()).await?;
                warn!(
                    end_date = %calendar.format_date(record.end_date),
                    "staged resource found outside the staging area, rescheduled"
                );
            }
            Transition::AwaitingManualDeletion => {
                debug!(
                    due_since = %calendar.format_date(current.end_date),
                    "deletion due but auto-delete is disabled"
                );
            }
        }
        Ok(())
    }

    /// Put `previous` back after the side effect that followed its
    /// replacement failed.
    pub(crate) async fn rollback(&self, previous: &DeletionRecord) {
        if let Err(err) = self.store.upsert(previous.clone()).await {
            error!(
                resource_id = %previous.resource_id,
                error = %err,
                "could not restore deletion record"
            );
        }
    }
}
