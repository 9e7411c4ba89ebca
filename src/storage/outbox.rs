use crate::core::Result;
use crate::interface::Notifier;
use crate::workflow::{MailKind, ResourceId};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

/// Notifier that keeps every message it was asked to send.
#[derive(Debug, Default)]
pub struct MailOutbox {
    sent: Mutex<Vec<(MailKind, ResourceId)>>,
}

impl MailOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(MailKind, ResourceId)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, resource_id: ResourceId) -> Vec<MailKind> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(_, id)| *id == resource_id)
            .map(|(mail, _)| *mail)
            .collect()
    }
}

#[async_trait]
impl Notifier for MailOutbox {
    async fn send(&self, mail: MailKind, resource_id: ResourceId) -> Result<()> {
        info!(mail = %mail, resource_id = %resource_id, "notification queued");
        self.sent.lock().await.push((mail, resource_id));
        Ok(())
    }
}
