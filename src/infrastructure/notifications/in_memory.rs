use crate::core::errors::BillbusterError;
use crate::core::models::notification::PushNotification;
use crate::infrastructure::notifications::Notifier;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Keeps every notification instead of delivering it. Used without Firebase and in tests.
#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    sent: Arc<RwLock<Vec<(String, PushNotification)>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        InMemoryNotifier::default()
    }

    pub async fn sent(&self) -> Vec<(String, PushNotification)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, notification: &PushNotification) -> Result<String, BillbusterError> {
        let message_id = format!("local/messages/{}", Uuid::new_v4());
        info!(message_id = %message_id, title = %notification.title, "Push notification recorded locally");
        let mut sent = self.sent.write().await;
        sent.push((message_id.clone(), notification.clone()));
        Ok(message_id)
    }
}
