use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A push message addressed to one device token.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PushNotification {
    pub token: String,
    pub title: String,
    pub body: String,
    /// FCM only carries string values in the data payload.
    pub data: BTreeMap<String, String>,
}

/// Flattens an arbitrary JSON object into string values; strings are kept as-is,
/// everything else is rendered as JSON text.
pub fn stringify_payload(data: Map<String, Value>) -> BTreeMap<String, String> {
    data.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}
