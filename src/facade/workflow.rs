use crate::calendar::Clock;
use crate::core::{DeletionError, Result};
use crate::interface::{Notifier, RecordStore, ResourceLifecycle};
use crate::workflow::{DeletionPolicy, DeletionRecord, DeletionTimeline, ResourceId, UpdateOutcome, UpdateRequest};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};

/// The deletion workflow wired to its collaborators.
///
/// This is the only place that performs side effects: it loads records,
/// asks [`DeletionPolicy`] what to do and applies the answer through the
/// injected store, resource platform and notifier.
pub struct DeletionWorkflow {
    pub(crate) policy: DeletionPolicy,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) resources: Arc<dyn ResourceLifecycle>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl DeletionWorkflow {
    pub fn new(
        policy: DeletionPolicy,
        store: Arc<dyn RecordStore>,
        resources: Arc<dyn ResourceLifecycle>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            store,
            resources,
            notifier,
            clock,
        }
    }

    pub fn policy(&self) -> &DeletionPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn record(&self, resource_id: ResourceId) -> Result<Option<DeletionRecord>> {
        self.store.get(resource_id).await
    }

    /// Put a newly created resource under the workflow.
    ///
    /// A resource that already has a record keeps it.
    pub async fn register_resource(&self, resource_id: ResourceId) -> Result<DeletionRecord> {
        if let Some(existing) = self.store.get(resource_id).await? {
            debug!(resource_id = %resource_id, status = %existing.status, "resource already registered");
            return Ok(existing);
        }

        let record = self.policy.initial_record(resource_id, self.now())?;
        self.store.upsert(record.clone()).await?;
        info!(
            resource_id = %resource_id,
            end_date = %self.policy.calendar().format_date(record.end_date),
            "resource registered for deletion"
        );
        Ok(record)
    }

    /// Drop the record of a resource that was deleted outside the workflow.
    pub async fn forget_resource(&self, resource_id: ResourceId) -> Result<bool> {
        let removed = self.store.delete(resource_id).await?;
        if removed {
            info!(resource_id = %resource_id, "deletion record removed");
        }
        Ok(removed)
    }

    pub async fn timeline(&self, resource_id: ResourceId) -> Result<DeletionTimeline> {
        let record = self
            .store
            .get(resource_id)
            .await?
            .ok_or(DeletionError::RecordNotFound(resource_id))?;
        self.policy.timeline(&record)
    }

    /// Apply a user-submitted schedule change.
    ///
    /// The record is written before the notification (if any) goes out. A
    /// failed send puts the previous record back.
    pub async fn update_from_request(
        &self,
        resource_id: ResourceId,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome> {
        let span = info_span!("workflow.update", resource_id = %resource_id);
        async move {
            let current = self
                .store
                .get(resource_id)
                .await?
                .ok_or(DeletionError::RecordNotFound(resource_id))?;

            let outcome = self
                .policy
                .reconcile_request(&current, &request, self.now())?;

            if outcome.record != current {
                self.store.upsert(outcome.record.clone()).await?;
            }
            if let Some(mail) = outcome.trigger_mail {
                if let Err(err) = self.notifier.send(mail, resource_id).await {
                    self.rollback(&current).await;
                    return Err(err);
                }
            }

            match outcome.minimum_date_forced {
                Some(minimum) => info!(
                    requested = %self.policy.calendar().format_date(request.end_date),
                    minimum = %self.policy.calendar().format_date(minimum),
                    status = %outcome.record.status,
                    "requested end date below minimum"
                ),
                None => debug!(
                    end_date = %self.policy.calendar().format_date(outcome.record.end_date),
                    status = %outcome.record.status,
                    "schedule updated"
                ),
            }

            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
