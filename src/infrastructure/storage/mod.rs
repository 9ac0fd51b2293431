use crate::core::errors::BillbusterError;
use crate::core::models::{
    group::{Group, NewGroup},
    reminder::Reminder,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

pub mod firestore;
pub mod in_memory;

pub type Document = Map<String, Value>;

/// A document as read back from the store, with the id the store assigned.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    #[serde(flatten)]
    pub data: Document,
}

/// Document-store collaborator. Transactions live in a child collection keyed by group.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn add_transaction(&self, group_id: &str, document: Document) -> Result<String, BillbusterError>;
    async fn get_transactions(&self, group_id: &str) -> Result<Vec<StoredDocument>, BillbusterError>;
    async fn create_group(&self, group: NewGroup) -> Result<Group, BillbusterError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, BillbusterError>;
    async fn update_group_members(&self, group_id: &str, members: &[String]) -> Result<(), BillbusterError>;
    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, BillbusterError>;
    async fn save_reminder(&self, reminder: Reminder) -> Result<Reminder, BillbusterError>;
    async fn get_pending_reminders(&self, recipient_id: Option<&str>) -> Result<Vec<Reminder>, BillbusterError>;
}
