use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum BillbusterError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Missing {0} parameter")]
    MissingParameter(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),
    #[error("User {0} is not a group member")]
    NotGroupMember(String),
    #[error("Cannot remove last group member")]
    CannotRemoveLastMember,

    #[error("Not found")]
    RouteNotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Request timed out")]
    RequestTimeout,

    /// A stored record could not be read as a transaction.
    #[error("Invalid transaction {id}: {reason}")]
    InvalidTransaction { id: String, reason: String },
    /// Splitting would divide by an empty member set.
    #[error("Transaction paid by {payer} has no members to split between")]
    EmptyMembers { payer: String },
    #[error("Balance arithmetic overflowed")]
    BalanceOverflow,

    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Notification error: {0}")]
    NotificationError(String),
    #[error("Authentication error: {0}")]
    AuthError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}
