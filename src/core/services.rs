use crate::core::balance::{self, Balances};
use crate::core::errors::{BillbusterError, FieldError};
use crate::core::models::{
    group::{Group, NewGroup},
    notification::{PushNotification, stringify_payload},
    reminder::{Reminder, ReminderStatus},
    transaction::{BillData, LineItemBill, RecordError, Transaction, bill_body},
};
use crate::infrastructure::notifications::Notifier;
use crate::infrastructure::storage::{Storage, StoredDocument};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

const MAX_NAME_LENGTH: usize = 100;
const MAX_ID_LENGTH: usize = 128;
const MAX_MESSAGE_LENGTH: usize = 1000;
const MAX_REMINDER_AMOUNT: f64 = 1_000_000.0;

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone, PartialEq)]
pub struct ScannedItem {
    pub name: String,
    pub price: f64,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone, PartialEq)]
pub struct ScannedBill {
    pub total: f64,
    pub items: Vec<ScannedItem>,
}

pub struct BillbusterService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    currency_decimals: u32,
}

fn require(value: Option<String>) -> Result<String, BillbusterError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(BillbusterError::MissingFields)
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@')
}

fn invalid_bill(error: RecordError) -> BillbusterError {
    let field = error.field();
    BillbusterError::InvalidInput(
        field.to_string(),
        FieldError::new(field, "Invalid bill data", error.to_string()),
    )
}

impl BillbusterService {
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<dyn Notifier>, currency_decimals: u32) -> Self {
        BillbusterService {
            storage,
            notifier,
            currency_decimals,
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), BillbusterError> {
        if value.trim().is_empty() {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(field, format!("Invalid {}", field), format!("{} cannot be empty", field)),
            ));
        }
        if value.len() > max_length {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("{} Too Long", field),
                    format!("{} cannot exceed {} characters", field, max_length),
                ),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("Invalid {}", field),
                    format!("{} contains invalid characters", field),
                ),
            ));
        }
        Ok(())
    }

    /// Ids end up as document path segments: only `[A-Za-z0-9._@-]`, never `.` or `..`,
    /// and no `__` prefix (reserved by Firestore).
    fn validate_id(&self, field: &str, value: &str) -> Result<(), BillbusterError> {
        self.validate_string_input(field, value, MAX_ID_LENGTH)?;
        if !value.chars().all(is_id_char) {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("Invalid {}", field),
                    format!("{} may only contain letters, digits, '.', '_', '@' and '-'", field),
                ),
            ));
        }
        if value == "." || value == ".." || value.starts_with("__") {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(field, format!("Invalid {}", field), format!("{} is a reserved id", field)),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: f64) -> Result<(), BillbusterError> {
        if !amount.is_finite() {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(field, "Invalid Amount", "Amount must be a finite number"),
            ));
        }
        if amount <= 0.0 {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(field, "Invalid Amount", "Amount must be greater than 0"),
            ));
        }
        if amount > MAX_REMINDER_AMOUNT {
            return Err(BillbusterError::InvalidInput(
                field.to_string(),
                FieldError::new(field, "Amount Too Large", "Amount cannot exceed 1,000,000"),
            ));
        }
        Ok(())
    }

    /// Placeholder for bill scanning; always answers with the same two-item bill.
    pub fn scan_bill(&self) -> ScannedBill {
        ScannedBill {
            total: 100.0,
            items: vec![
                ScannedItem {
                    name: "Item 1".to_string(),
                    price: 50.0,
                },
                ScannedItem {
                    name: "Item 2".to_string(),
                    price: 50.0,
                },
            ],
        }
    }

    pub async fn save_transaction(
        &self,
        group_id: Option<String>,
        bill_data: Option<Value>,
    ) -> Result<String, BillbusterError> {
        let group_id = require(group_id)?;
        let mut document = match bill_data {
            Some(Value::Object(map)) if !map.is_empty() => map,
            Some(Value::Object(_)) | Some(Value::Null) | None => return Err(BillbusterError::MissingFields),
            Some(_) => return Err(invalid_bill(RecordError::NotAnObject)),
        };
        self.validate_id("groupId", &group_id)?;

        match BillData::from_object(&document).map_err(invalid_bill)? {
            BillData::Split(transaction) => {
                if transaction.members.is_empty() {
                    return Err(BillbusterError::InvalidInput(
                        "members".to_string(),
                        FieldError::new(
                            "members",
                            "Invalid bill data",
                            "members must list at least one participant",
                        ),
                    ));
                }
            }
            BillData::Itemized(_) => {
                let items = bill_body(&document)
                    .get("items")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                LineItemBill::validate_submitted(items).map_err(invalid_bill)?;
            }
        }

        document.insert("createdAt".to_string(), Value::String(Utc::now().to_rfc3339()));
        let transaction_id = self.storage.add_transaction(&group_id, document).await?;
        info!(group_id = %group_id, transaction_id = %transaction_id, "Transaction saved");
        Ok(transaction_id)
    }

    /// Even-split balances for a group. Any malformed split record fails the whole request.
    pub async fn get_balances(&self, group_id: &str) -> Result<Balances, BillbusterError> {
        self.validate_id("groupId", group_id)?;
        let documents = self.storage.get_transactions(group_id).await?;

        let mut transactions: Vec<Transaction> = Vec::with_capacity(documents.len());
        for document in &documents {
            match BillData::from_object(&document.data) {
                Ok(BillData::Split(transaction)) => transactions.push(transaction),
                Ok(BillData::Itemized(_)) => {
                    debug!(transaction_id = %document.id, "Skipping itemized bill in split balances");
                }
                Err(e) => {
                    warn!(group_id, transaction_id = %document.id, error = %e, "Unreadable transaction");
                    return Err(BillbusterError::InvalidTransaction {
                        id: document.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let balances = balance::compute_balances(&transactions)?;
        debug!(group_id, transactions = transactions.len(), participants = balances.len(), "Balances computed");
        Ok(balance::round_balances(balances, self.currency_decimals))
    }

    /// Gross amount each person paid across itemized bills. Nothing is split.
    pub async fn get_line_item_totals(&self, group_id: &str) -> Result<Balances, BillbusterError> {
        self.validate_id("groupId", group_id)?;
        let documents = self.storage.get_transactions(group_id).await?;

        let bills: Vec<LineItemBill> = documents
            .iter()
            .filter_map(|document| match BillData::from_object(&document.data) {
                Ok(BillData::Itemized(bill)) => Some(bill),
                _ => None,
            })
            .collect();

        let totals = balance::tally_line_items(&bills)?;
        Ok(balance::round_balances(totals, self.currency_decimals))
    }

    pub async fn get_group_transactions(&self, group_id: &str) -> Result<Vec<StoredDocument>, BillbusterError> {
        self.validate_id("groupId", group_id)?;
        self.storage.get_transactions(group_id).await
    }

    pub async fn create_group(
        &self,
        name: Option<String>,
        members: Option<Vec<String>>,
    ) -> Result<Group, BillbusterError> {
        let name = require(name)?;
        let members = members.filter(|m| !m.is_empty()).ok_or(BillbusterError::MissingFields)?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;

        let mut unique: Vec<String> = Vec::with_capacity(members.len());
        for member in members {
            self.validate_id("members", &member)?;
            if !unique.contains(&member) {
                unique.push(member);
            }
        }

        let group = self
            .storage
            .create_group(NewGroup {
                name,
                members: unique,
                created_at: Utc::now(),
            })
            .await?;
        info!(group_id = %group.id, members = group.members.len(), "Group created");
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, BillbusterError> {
        self.validate_id("groupId", group_id)?;
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| BillbusterError::GroupNotFound(group_id.to_string()))
    }

    pub async fn get_user_groups(&self, user_id: Option<String>) -> Result<Vec<Group>, BillbusterError> {
        let user_id = user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| BillbusterError::MissingParameter("userId".to_string()))?;
        self.storage.get_user_groups(&user_id).await
    }

    pub async fn add_member(&self, group_id: &str, user_id: Option<String>) -> Result<Group, BillbusterError> {
        let user_id = require(user_id)?;
        self.validate_id("userId", &user_id)?;
        let mut group = self.get_group(group_id).await?;

        if group.is_member(&user_id) {
            return Err(BillbusterError::AlreadyGroupMember(user_id));
        }
        group.members.push(user_id.clone());
        self.storage.update_group_members(&group.id, &group.members).await?;

        info!(group_id, user_id = %user_id, "Member added");
        Ok(group)
    }

    pub async fn remove_member(&self, group_id: &str, user_id: &str) -> Result<Group, BillbusterError> {
        self.validate_id("userId", user_id)?;
        let mut group = self.get_group(group_id).await?;

        if !group.is_member(user_id) {
            return Err(BillbusterError::NotGroupMember(user_id.to_string()));
        }
        if group.members.len() <= 1 {
            return Err(BillbusterError::CannotRemoveLastMember);
        }
        group.members.retain(|m| m != user_id);
        self.storage.update_group_members(&group.id, &group.members).await?;

        info!(group_id, user_id, "Member removed");
        Ok(group)
    }

    pub async fn send_reminder(
        &self,
        recipient_id: Option<String>,
        amount: Option<f64>,
        message: Option<String>,
    ) -> Result<Reminder, BillbusterError> {
        let recipient_id = require(recipient_id)?;
        let amount = amount.ok_or(BillbusterError::MissingFields)?;
        let message = require(message)?;
        self.validate_id("recipientId", &recipient_id)?;
        self.validate_amount_input("amount", amount)?;
        self.validate_string_input("message", &message, MAX_MESSAGE_LENGTH)?;

        let reminder = self
            .storage
            .save_reminder(Reminder {
                id: String::new(),
                recipient_id,
                amount,
                message,
                timestamp: Utc::now(),
                status: ReminderStatus::Pending,
            })
            .await?;
        info!(reminder_id = %reminder.id, recipient_id = %reminder.recipient_id, "Reminder saved");
        Ok(reminder)
    }

    pub async fn get_pending_reminders(&self, recipient_id: Option<String>) -> Result<Vec<Reminder>, BillbusterError> {
        let recipient_id = recipient_id.filter(|r| !r.trim().is_empty());
        self.storage.get_pending_reminders(recipient_id.as_deref()).await
    }

    pub async fn send_notification(
        &self,
        token: Option<String>,
        title: Option<String>,
        body: Option<String>,
        data: Option<Map<String, Value>>,
    ) -> Result<String, BillbusterError> {
        let notification = PushNotification {
            token: require(token)?,
            title: require(title)?,
            body: require(body)?,
            data: stringify_payload(data.unwrap_or_default()),
        };
        self.notifier.send(&notification).await
    }
}
