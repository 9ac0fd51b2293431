use crate::core::errors::BillbusterError;
use crate::core::models::{
    group::{Group, NewGroup},
    reminder::{Reminder, ReminderStatus},
};
use crate::infrastructure::storage::{Document, Storage, StoredDocument};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    transactions: Arc<RwLock<HashMap<String, Vec<StoredDocument>>>>,
    reminders: Arc<RwLock<Vec<Reminder>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn add_transaction(&self, group_id: &str, document: Document) -> Result<String, BillbusterError> {
        let id = Uuid::new_v4().to_string();
        let mut transactions = self.transactions.write().await;
        transactions
            .entry(group_id.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                data: document,
            });
        Ok(id)
    }

    async fn get_transactions(&self, group_id: &str) -> Result<Vec<StoredDocument>, BillbusterError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(group_id).cloned().unwrap_or_default())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group, BillbusterError> {
        let group = group.with_id(Uuid::new_v4().to_string());
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, BillbusterError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn update_group_members(&self, group_id: &str, members: &[String]) -> Result<(), BillbusterError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| BillbusterError::GroupNotFound(group_id.to_string()))?;
        group.members = members.to_vec();
        Ok(())
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, BillbusterError> {
        let groups = self.groups.read().await;
        let mut found: Vec<Group> = groups.values().filter(|g| g.is_member(user_id)).cloned().collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn save_reminder(&self, mut reminder: Reminder) -> Result<Reminder, BillbusterError> {
        reminder.id = Uuid::new_v4().to_string();
        let mut reminders = self.reminders.write().await;
        reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn get_pending_reminders(&self, recipient_id: Option<&str>) -> Result<Vec<Reminder>, BillbusterError> {
        let reminders = self.reminders.read().await;
        Ok(reminders
            .iter()
            .filter(|r| r.status == ReminderStatus::Pending)
            .filter(|r| recipient_id.is_none_or(|id| r.recipient_id == id))
            .cloned()
            .collect())
    }
}
