use crate::core::Result;
use crate::interface::RecordStore;
use crate::workflow::{DeletionRecord, ResourceId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Deletion records held in memory, listed in resource-id order.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<ResourceId, DeletionRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. from a snapshot taken elsewhere.
    pub fn with_records(records: impl IntoIterator<Item = DeletionRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.resource_id, record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, resource_id: ResourceId) -> Result<Option<DeletionRecord>> {
        Ok(self.records.read().await.get(&resource_id).cloned())
    }

    async fn upsert(&self, record: DeletionRecord) -> Result<()> {
        self.records.write().await.insert(record.resource_id, record);
        Ok(())
    }

    async fn delete(&self, resource_id: ResourceId) -> Result<bool> {
        Ok(self.records.write().await.remove(&resource_id).is_some())
    }

    async fn list_all(&self) -> Result<Vec<DeletionRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
