use async_trait::async_trait;
use chrono::{DateTime, Utc};
use staged_deletion::{
    DeletionError, DeletionRecord, DeletionStatus, DeletionWorkflow, InMemoryRecordStore,
    InMemoryResources, Location, MailKind, MailOutbox, ManualClock, Notifier, RecordStore,
    ResourceId, ResourceLifecycle, Result, UpdateRequest, WorkflowConfig,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1, 0).unwrap()
}

/// Consume one pending failure, if any.
fn trip(pending: &AtomicUsize) -> bool {
    pending
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Default)]
struct FlakyStore {
    inner: InMemoryRecordStore,
    failing_upserts: AtomicUsize,
    failing_deletes: AtomicUsize,
    /// Listed by `list_all` but gone by the time they are fetched.
    vanished: Vec<DeletionRecord>,
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get(&self, resource_id: ResourceId) -> Result<Option<DeletionRecord>> {
        self.inner.get(resource_id).await
    }

    async fn upsert(&self, record: DeletionRecord) -> Result<()> {
        if trip(&self.failing_upserts) {
            return Err(DeletionError::Store("write rejected".to_string()));
        }
        self.inner.upsert(record).await
    }

    async fn delete(&self, resource_id: ResourceId) -> Result<bool> {
        if trip(&self.failing_deletes) {
            return Err(DeletionError::Store("delete rejected".to_string()));
        }
        self.inner.delete(resource_id).await
    }

    async fn list_all(&self) -> Result<Vec<DeletionRecord>> {
        let mut records = self.inner.list_all().await?;
        records.extend(self.vanished.iter().cloned());
        Ok(records)
    }
}

#[derive(Default)]
struct FlakyResources {
    inner: InMemoryResources,
    failing_deletes: AtomicUsize,
}

#[async_trait]
impl ResourceLifecycle for FlakyResources {
    async fn delete_resource(&self, resource_id: ResourceId) -> Result<()> {
        if trip(&self.failing_deletes) {
            return Err(DeletionError::Resource("platform unavailable".to_string()));
        }
        self.inner.delete_resource(resource_id).await
    }

    async fn move_to_staging_area(&self, resource_id: ResourceId) -> Result<bool> {
        self.inner.move_to_staging_area(resource_id).await
    }

    async fn is_in_staging_area(&self, resource_id: ResourceId) -> Result<bool> {
        self.inner.is_in_staging_area(resource_id).await
    }
}

#[derive(Default)]
struct FlakyNotifier {
    outbox: MailOutbox,
    failing_sends: AtomicUsize,
}

#[async_trait]
impl Notifier for FlakyNotifier {
    async fn send(&self, mail: MailKind, resource_id: ResourceId) -> Result<()> {
        if trip(&self.failing_sends) {
            return Err(DeletionError::Notification("smtp timeout".to_string()));
        }
        self.outbox.send(mail, resource_id).await
    }
}

struct Rig {
    workflow: DeletionWorkflow,
    store: Arc<FlakyStore>,
    resources: Arc<FlakyResources>,
    notifier: Arc<FlakyNotifier>,
}

fn rig(store: FlakyStore) -> Rig {
    let store = Arc::new(store);
    let resources = Arc::new(FlakyResources::default());
    let notifier = Arc::new(FlakyNotifier::default());
    let workflow = DeletionWorkflow::new(
        WorkflowConfig::default().policy().unwrap(),
        store.clone(),
        resources.clone(),
        notifier.clone(),
        Arc::new(ManualClock::new(at("2024-03-15T10:30:00Z"))),
    );
    Rig {
        workflow,
        store,
        resources,
        notifier,
    }
}

async fn staged_resource(rig: &Rig) -> DeletionRecord {
    let id = rig.resources.inner.create("Staged").await;
    rig.resources
        .inner
        .relocate(id, Location::StagingArea)
        .await
        .unwrap();
    let record = DeletionRecord::new(id, epoch(), DeletionStatus::StagedForDeletion);
    rig.store.upsert(record.clone()).await.unwrap();
    record
}

#[tokio::test]
async fn test_failed_record_delete_keeps_resource() {
    let rig = rig(FlakyStore::default());
    let record = staged_resource(&rig).await;
    let id = record.resource_id;
    rig.store.failing_deletes.store(1, Ordering::SeqCst);

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, DeletionError::Store(_)));
    assert!(rig.resources.inner.exists(id).await);
    assert_eq!(rig.store.get(id).await.unwrap(), Some(record));

    // Retried, not restored to phase 1
    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.restored, 0);
    assert_eq!(report.deleted, 1);
    assert!(!rig.resources.inner.exists(id).await);
    assert!(rig.store.get(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_resource_delete_restores_record() {
    let rig = rig(FlakyStore::default());
    let record = staged_resource(&rig).await;
    let id = record.resource_id;
    rig.resources.failing_deletes.store(1, Ordering::SeqCst);

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, DeletionError::Resource(_)));
    assert_eq!(rig.store.get(id).await.unwrap(), Some(record));
    assert!(rig.resources.inner.exists(id).await);

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.deleted, 1);
    assert!(rig.store.get(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_record_write_sends_no_mail() {
    let rig = rig(FlakyStore::default());
    let id = rig.resources.inner.create("Due").await;
    let record = DeletionRecord::new(id, epoch(), DeletionStatus::Scheduled);
    rig.store.upsert(record.clone()).await.unwrap();
    rig.store.failing_upserts.store(1, Ordering::SeqCst);

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(rig.notifier.outbox.sent().await.is_empty());
    assert_eq!(rig.store.get(id).await.unwrap(), Some(record));

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(
        rig.notifier.outbox.sent_to(id).await,
        vec![MailKind::WillBeStagedForDeletion]
    );
}

#[tokio::test]
async fn test_failed_mail_restores_record() {
    let rig = rig(FlakyStore::default());
    let id = rig.resources.inner.create("Due").await;
    let record = DeletionRecord::new(id, epoch(), DeletionStatus::Scheduled);
    rig.store.upsert(record.clone()).await.unwrap();
    rig.notifier.failing_sends.store(1, Ordering::SeqCst);

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.notified, 0);
    assert!(matches!(report.failures[0].error, DeletionError::Notification(_)));
    assert_eq!(rig.store.get(id).await.unwrap(), Some(record));

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.notified, 1);
    let stored = rig.store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.status, DeletionStatus::ScheduledNotified);
    assert_eq!(rig.notifier.outbox.sent().await.len(), 1);
}

#[tokio::test]
async fn test_failed_update_mail_keeps_previous_date() {
    let rig = rig(FlakyStore::default());
    let id = rig.resources.inner.create("Extended").await;
    let record = DeletionRecord::new(
        id,
        at("2024-04-10T00:00:00Z"),
        DeletionStatus::StagedForDeletion,
    );
    rig.store.upsert(record.clone()).await.unwrap();
    rig.notifier.failing_sends.store(1, Ordering::SeqCst);

    let request = UpdateRequest::new(at("2024-05-01T00:00:00Z"));
    let result = rig.workflow.update_from_request(id, request).await;
    assert!(matches!(result, Err(DeletionError::Notification(_))));
    assert_eq!(rig.store.get(id).await.unwrap(), Some(record));

    let outcome = rig.workflow.update_from_request(id, request).await.unwrap();
    assert_eq!(outcome.trigger_mail, Some(MailKind::WillBeDeletedSoon));
    assert_eq!(
        rig.notifier.outbox.sent_to(id).await,
        vec![MailKind::WillBeDeletedSoon]
    );
}

#[tokio::test]
async fn test_record_gone_before_processing_is_skipped() {
    let ghost = DeletionRecord::new(ResourceId(404), epoch(), DeletionStatus::Scheduled);
    let rig = rig(FlakyStore {
        vanished: vec![ghost],
        ..FlakyStore::default()
    });
    let id = rig.resources.inner.create("Real").await;
    rig.store
        .upsert(DeletionRecord::new(id, epoch(), DeletionStatus::Scheduled))
        .await
        .unwrap();

    let report = rig.workflow.sweep().await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.notified, 1);
    assert!(report.is_clean());
    assert!(rig.notifier.outbox.sent_to(ResourceId(404)).await.is_empty());
}
