pub mod fcm;
pub mod in_memory;

use crate::core::errors::BillbusterError;
use crate::core::models::notification::PushNotification;
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatches one push message and returns the provider's message id.
    async fn send(&self, notification: &PushNotification) -> Result<String, BillbusterError>;
}
