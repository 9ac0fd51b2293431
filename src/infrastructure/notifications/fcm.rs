use crate::core::errors::BillbusterError;
use crate::core::models::notification::PushNotification;
use crate::infrastructure::google::auth::ServiceAccountAuth;
use crate::infrastructure::notifications::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

const FCM_ROOT: &str = "https://fcm.googleapis.com/v1";

/// Firebase Cloud Messaging over the HTTP v1 API.
pub struct FcmNotifier {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    send_url: String,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

impl FcmNotifier {
    pub fn new(client: Client, auth: Arc<ServiceAccountAuth>) -> Self {
        let send_url = format!("{}/projects/{}/messages:send", FCM_ROOT, auth.project_id());
        FcmNotifier { client, auth, send_url }
    }
}

pub fn message_body(notification: &PushNotification) -> Value {
    json!({
        "message": {
            "token": notification.token,
            "notification": {
                "title": notification.title,
                "body": notification.body,
            },
            "data": notification.data,
        }
    })
}

#[async_trait]
impl Notifier for FcmNotifier {
    async fn send(&self, notification: &PushNotification) -> Result<String, BillbusterError> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(token)
            .json(&message_body(notification))
            .send()
            .await
            .map_err(|e| BillbusterError::NotificationError(format!("FCM request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BillbusterError::NotificationError(format!(
                "FCM send failed: {} - {}",
                status, error_text
            )));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| BillbusterError::NotificationError(format!("Malformed FCM response: {}", e)))?;
        info!(message_id = %sent.name, "Push notification dispatched");
        Ok(sent.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_message_body_shape() {
        let notification = PushNotification {
            token: "device-1".to_string(),
            title: "Pay up".to_string(),
            body: "You owe Alice 25.00".to_string(),
            data: BTreeMap::from([("groupId".to_string(), "g1".to_string())]),
        };
        let body = message_body(&notification);
        assert_eq!(body["message"]["token"], "device-1");
        assert_eq!(body["message"]["notification"]["title"], "Pay up");
        assert_eq!(body["message"]["data"]["groupId"], "g1");
    }
}
