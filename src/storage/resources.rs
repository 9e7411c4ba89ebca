use crate::core::{DeletionError, Result};
use crate::interface::ResourceLifecycle;
use crate::workflow::ResourceId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Active,
    StagingArea,
}

#[derive(Debug, Clone)]
struct ResourceEntry {
    name: String,
    location: Location,
    /// Moves into the staging area are refused while set.
    pinned: bool,
}

/// In-memory stand-in for the platform that owns the resources.
#[derive(Debug)]
pub struct InMemoryResources {
    staging_area: String,
    next_id: AtomicU64,
    entries: RwLock<BTreeMap<ResourceId, ResourceEntry>>,
}

impl InMemoryResources {
    pub fn new(staging_area: impl Into<String>) -> Self {
        Self {
            staging_area: staging_area.into(),
            next_id: AtomicU64::new(1),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn staging_area(&self) -> &str {
        &self.staging_area
    }

    /// Create a resource outside the staging area.
    pub async fn create(&self, name: impl Into<String>) -> ResourceId {
        let id = ResourceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let entry = ResourceEntry {
            name: name.into(),
            location: Location::Active,
            pinned: false,
        };
        self.entries.write().await.insert(id, entry);
        id
    }

    pub async fn exists(&self, resource_id: ResourceId) -> bool {
        self.entries.read().await.contains_key(&resource_id)
    }

    pub async fn location(&self, resource_id: ResourceId) -> Option<Location> {
        self.entries
            .read()
            .await
            .get(&resource_id)
            .map(|entry| entry.location)
    }

    /// Move a resource somewhere, bypassing the workflow, the way an
    /// administrator would.
    pub async fn relocate(&self, resource_id: ResourceId, location: Location) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&resource_id)
            .ok_or_else(|| DeletionError::Resource(format!("resource {} does not exist", resource_id)))?;
        entry.location = location;
        Ok(())
    }

    pub async fn set_pinned(&self, resource_id: ResourceId, pinned: bool) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&resource_id)
            .ok_or_else(|| DeletionError::Resource(format!("resource {} does not exist", resource_id)))?;
        entry.pinned = pinned;
        Ok(())
    }
}

impl Default for InMemoryResources {
    fn default() -> Self {
        Self::new("trash")
    }
}

#[async_trait]
impl ResourceLifecycle for InMemoryResources {
    async fn delete_resource(&self, resource_id: ResourceId) -> Result<()> {
        match self.entries.write().await.remove(&resource_id) {
            Some(entry) => {
                debug!(resource_id = %resource_id, name = %entry.name, "resource deleted");
                Ok(())
            }
            None => Err(DeletionError::Resource(format!(
                "resource {} does not exist",
                resource_id
            ))),
        }
    }

    async fn move_to_staging_area(&self, resource_id: ResourceId) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&resource_id) else {
            return Ok(false);
        };
        if entry.pinned {
            return Ok(false);
        }
        entry.location = Location::StagingArea;
        debug!(resource_id = %resource_id, area = %self.staging_area, "resource moved to staging area");
        Ok(true)
    }

    async fn is_in_staging_area(&self, resource_id: ResourceId) -> Result<bool> {
        Ok(self.location(resource_id).await == Some(Location::StagingArea))
    }
}
