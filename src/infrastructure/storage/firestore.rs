//! Firestore backend over the v1 REST API.
//!
//! Layout mirrors the mobile client's expectations:
//! `groups/{groupId}`, `groups/{groupId}/transactions/{id}` and `reminders/{id}`.

use crate::core::errors::BillbusterError;
use crate::core::models::{
    group::{Group, NewGroup},
    reminder::{Reminder, ReminderStatus},
};
use crate::infrastructure::google::auth::ServiceAccountAuth;
use crate::infrastructure::storage::{Document, Storage, StoredDocument};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value, json};
use std::sync::Arc;
use tracing::debug;

const API_ROOT: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;
/// Top-level keys written as Firestore timestamps rather than strings.
const TIMESTAMP_KEYS: [&str; 2] = ["createdAt", "timestamp"];

pub struct FirestoreStorage {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    documents_url: String,
}

impl FirestoreStorage {
    pub fn new(client: Client, auth: Arc<ServiceAccountAuth>) -> Self {
        let documents_url = format!("{}/projects/{}/databases/(default)/documents", API_ROOT, auth.project_id());
        FirestoreStorage {
            client,
            auth,
            documents_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.documents_url, path)
    }

    /// Sends an authorised request. A 404 comes back as `None`.
    async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>, BillbusterError> {
        let token = self.auth.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BillbusterError::StorageError(format!("Firestore request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BillbusterError::StorageError(format!(
                "Firestore request failed: {} - {}",
                status, error_text
            )));
        }
        response
            .json::<Value>()
            .await
            .map(Some)
            .map_err(|e| BillbusterError::StorageError(format!("Malformed Firestore response: {}", e)))
    }

    async fn create_document(&self, collection: &str, document: &Document) -> Result<StoredDocument, BillbusterError> {
        let body = json!({ "fields": encode_fields(document) });
        let created = self
            .execute(self.client.post(self.url(collection)).json(&body))
            .await?
            .ok_or_else(|| BillbusterError::StorageError(format!("Collection {} not found", collection)))?;
        decode_document(&created)
            .ok_or_else(|| BillbusterError::StorageError("Firestore returned a document without a name".to_string()))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>, BillbusterError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(self.url(collection))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let Some(page) = self.execute(request).await? else { break };
            if let Some(Value::Array(found)) = page.get("documents") {
                documents.extend(found.iter().filter_map(decode_document));
            }
            page_token = page.get("nextPageToken").and_then(Value::as_str).map(String::from);
            if page_token.is_none() {
                break;
            }
        }
        debug!(collection, count = documents.len(), "Listed Firestore documents");
        Ok(documents)
    }

    async fn run_query(&self, collection: &str, filters: Vec<Value>) -> Result<Vec<StoredDocument>, BillbusterError> {
        let condition = match filters.len() {
            0 => None,
            1 => filters.into_iter().next(),
            _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
        };
        let mut query = json!({ "from": [{ "collectionId": collection }] });
        if let Some(condition) = condition {
            query["where"] = condition;
        }

        let results = self
            .execute(
                self.client
                    .post(format!("{}:runQuery", self.documents_url))
                    .json(&json!({ "structuredQuery": query })),
            )
            .await?
            .unwrap_or(Value::Array(Vec::new()));

        Ok(results
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("document"))
                    .filter_map(decode_document)
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn field_filter(path: &str, op: &str, value: &Value) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": path },
            "op": op,
            "value": encode_value(value),
        }
    })
}

fn pending_reminder_filters(recipient_id: Option<&str>) -> Vec<Value> {
    let mut filters = vec![field_filter("status", "EQUAL", &json!(ReminderStatus::Pending))];
    if let Some(recipient_id) = recipient_id {
        filters.push(field_filter("recipientId", "EQUAL", &json!(recipient_id)));
    }
    filters
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, BillbusterError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(BillbusterError::StorageError("Expected an object document".to_string())),
        Err(e) => Err(BillbusterError::StorageError(format!("Failed to serialize document: {}", e))),
    }
}

fn from_document<T: DeserializeOwned>(stored: StoredDocument) -> Result<T, BillbusterError> {
    let mut data = stored.data;
    data.insert("id".to_string(), Value::String(stored.id.clone()));
    serde_json::from_value(Value::Object(data))
        .map_err(|e| BillbusterError::StorageError(format!("Malformed document {}: {}", stored.id, e)))
}

#[async_trait]
impl Storage for FirestoreStorage {
    async fn add_transaction(&self, group_id: &str, document: Document) -> Result<String, BillbusterError> {
        let created = self
            .create_document(&format!("groups/{}/transactions", group_id), &document)
            .await?;
        Ok(created.id)
    }

    async fn get_transactions(&self, group_id: &str) -> Result<Vec<StoredDocument>, BillbusterError> {
        self.list_documents(&format!("groups/{}/transactions", group_id)).await
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group, BillbusterError> {
        let created = self.create_document("groups", &to_document(&group)?).await?;
        Ok(group.with_id(created.id))
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, BillbusterError> {
        let Some(found) = self.execute(self.client.get(self.url(&format!("groups/{}", group_id)))).await? else {
            return Ok(None);
        };
        decode_document(&found).map(from_document).transpose()
    }

    async fn update_group_members(&self, group_id: &str, members: &[String]) -> Result<(), BillbusterError> {
        let mut fields = Map::new();
        fields.insert("members".to_string(), json!(members));
        let request = self
            .client
            .patch(self.url(&format!("groups/{}", group_id)))
            .query(&[("updateMask.fieldPaths", "members"), ("currentDocument.exists", "true")])
            .json(&json!({ "fields": encode_fields(&fields) }));

        self.execute(request)
            .await?
            .map(|_| ())
            .ok_or_else(|| BillbusterError::GroupNotFound(group_id.to_string()))
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, BillbusterError> {
        let filters = vec![field_filter("members", "ARRAY_CONTAINS", &json!(user_id))];
        self.run_query("groups", filters)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    async fn save_reminder(&self, mut reminder: Reminder) -> Result<Reminder, BillbusterError> {
        let mut document = to_document(&reminder)?;
        document.remove("id");
        reminder.id = self.create_document("reminders", &document).await?.id;
        Ok(reminder)
    }

    async fn get_pending_reminders(&self, recipient_id: Option<&str>) -> Result<Vec<Reminder>, BillbusterError> {
        self.run_query("reminders", pending_reminder_filters(recipient_id))
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }
}

pub fn encode_fields(document: &Document) -> Map<String, Value> {
    document
        .iter()
        .map(|(key, value)| {
            let encoded = match value {
                Value::String(s) if TIMESTAMP_KEYS.contains(&key.as_str()) && DateTime::parse_from_rfc3339(s).is_ok() => {
                    json!({ "timestampValue": s })
                }
                other => encode_value(other),
            };
            (key.clone(), encoded)
        })
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": { "fields": map.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect::<Map<_, _>>() }
        }),
    }
}

pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))),
        _ => Value::Null,
    }
}

fn decode_fields(fields: Option<&Value>) -> Map<String, Value> {
    fields
        .and_then(Value::as_object)
        .map(|fields| fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
        .unwrap_or_default()
}

/// Turns a Firestore `Document` resource into a plain JSON document keyed by its id.
pub fn decode_document(resource: &Value) -> Option<StoredDocument> {
    let name = resource.get("name")?.as_str()?;
    let id = name.rsplit('/').next()?.to_string();
    Some(StoredDocument {
        id,
        data: decode_fields(resource.get("fields")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_then_decode_keeps_bill_document() {
        let bill = json!({
            "payer": "alice",
            "amount": 42.5,
            "members": ["alice", "bob"],
            "settled": false,
            "note": null,
            "items": [{ "name": "Pizza", "price": 20, "paidBy": "bob" }]
        });
        let fields = encode_fields(bill.as_object().unwrap());
        let resource = json!({ "name": "projects/p/databases/(default)/documents/groups/g1/transactions/t1", "fields": fields });

        let stored = decode_document(&resource).unwrap();
        assert_eq!(stored.id, "t1");
        assert_eq!(Value::Object(stored.data), bill);
    }

    #[test]
    fn test_timestamp_keys_become_timestamp_values() {
        let document = json!({ "createdAt": "2024-06-01T12:34:56Z", "name": "2024-06-01T12:34:56Z" });
        let fields = encode_fields(document.as_object().unwrap());
        assert_eq!(fields["createdAt"], json!({ "timestampValue": "2024-06-01T12:34:56Z" }));
        assert_eq!(fields["name"], json!({ "stringValue": "2024-06-01T12:34:56Z" }));
    }

    #[test]
    fn test_integer_values_are_sent_as_strings() {
        assert_eq!(encode_value(&json!(100)), json!({ "integerValue": "100" }));
        assert_eq!(decode_value(&json!({ "integerValue": "100" })), json!(100));
    }

    #[test]
    fn test_empty_array_and_map_decode() {
        assert_eq!(decode_value(&json!({ "arrayValue": {} })), json!([]));
        assert_eq!(decode_value(&json!({ "mapValue": {} })), json!({}));
    }

    #[test]
    fn test_pending_reminder_filters_use_serialized_status() {
        let filters = pending_reminder_filters(Some("bob"));
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0]["fieldFilter"]["field"]["fieldPath"], "status");
        assert_eq!(filters[0]["fieldFilter"]["value"], json!({ "stringValue": "pending" }));
        assert_eq!(filters[1]["fieldFilter"]["value"], json!({ "stringValue": "bob" }));
        assert_eq!(pending_reminder_filters(None).len(), 1);
    }

    #[test]
    fn test_document_without_name_is_dropped() {
        assert!(decode_document(&json!({ "fields": {} })).is_none());
    }
}
