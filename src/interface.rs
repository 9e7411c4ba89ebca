use crate::core::Result;
use crate::workflow::{DeletionRecord, MailKind, ResourceId};
use async_trait::async_trait;

/// Storage for deletion records, keyed by resource id.
///
/// The in-memory implementation in [`crate::storage`] is enough for tests and
/// simulation; a real deployment wraps its own table behind this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, resource_id: ResourceId) -> Result<Option<DeletionRecord>>;

    /// Insert or replace the record for `record.resource_id`.
    async fn upsert(&self, record: DeletionRecord) -> Result<()>;

    /// Remove a record. Returns whether one existed.
    async fn delete(&self, resource_id: ResourceId) -> Result<bool>;

    async fn list_all(&self) -> Result<Vec<DeletionRecord>>;
}

/// The platform operations the workflow needs on the managed resources.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    async fn delete_resource(&self, resource_id: ResourceId) -> Result<()>;

    /// Move the resource into the staging area. `false` means the platform
    /// refused the move.
    async fn move_to_staging_area(&self, resource_id: ResourceId) -> Result<bool>;

    async fn is_in_staging_area(&self, resource_id: ResourceId) -> Result<bool>;
}

/// Delivery of workflow notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: MailKind, resource_id: ResourceId) -> Result<()>;
}
