use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::core::{
    balance::Balances,
    errors::BillbusterError,
    models::{group::Group, reminder::Reminder},
    services::ScannedBill,
};
use crate::infrastructure::storage::StoredDocument;

// Every field is optional on the wire so a missing one becomes a 400 with
// `{ "error": ... }` instead of a bare deserialization rejection.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveTransactionRequest {
    pub group_id: Option<String>,
    /// Either `{ payer, amount, members }` or `{ items: [{ name, price, paidBy }] }`.
    #[schema(value_type = Object)]
    pub bill_data: Option<Value>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub members: Option<Vec<String>>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderRequest {
    pub recipient_id: Option<String>,
    pub amount: Option<f64>,
    pub message: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SendNotificationRequest {
    pub token: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    #[schema(value_type = Object)]
    pub data: Option<Map<String, Value>>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserGroupsQuery {
    pub user_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RemindersQuery {
    pub recipient_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        SuccessResponse { success: true }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    pub success: bool,
    pub data: ScannedBill,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveTransactionResponse {
    pub success: bool,
    pub transaction_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    pub success: bool,
    pub balances: BTreeMap<String, f64>,
}

impl TryFrom<Balances> for BalanceResponse {
    type Error = BillbusterError;

    fn try_from(balances: Balances) -> Result<Self, Self::Error> {
        let balances = balances
            .into_iter()
            .map(|(participant, amount)| {
                amount
                    .to_f64()
                    .map(|value| (participant, value))
                    .ok_or(BillbusterError::BalanceOverflow)
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(BalanceResponse {
            success: true,
            balances,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct TransactionsResponse {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<StoredDocument>,
}

#[derive(Serialize, ToSchema)]
pub struct GroupsResponse {
    pub success: bool,
    pub groups: Vec<Group>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupResponse {
    pub success: bool,
    pub group_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct GroupResponse {
    pub success: bool,
    pub group: Group,
}

#[derive(Serialize, ToSchema)]
pub struct RemindersResponse {
    pub success: bool,
    pub reminders: Vec<Reminder>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub success: bool,
    pub message_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for BillbusterError to implement IntoResponse
pub struct ApiError(pub BillbusterError);

impl From<BillbusterError> for ApiError {
    fn from(err: BillbusterError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(BillbusterError::InvalidBody(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BillbusterError::MissingFields
            | BillbusterError::MissingParameter(_)
            | BillbusterError::InvalidInput(..)
            | BillbusterError::InvalidBody(_)
            | BillbusterError::CannotRemoveLastMember => StatusCode::BAD_REQUEST,
            BillbusterError::GroupNotFound(_)
            | BillbusterError::NotGroupMember(_)
            | BillbusterError::RouteNotFound => StatusCode::NOT_FOUND,
            BillbusterError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            BillbusterError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            BillbusterError::AlreadyGroupMember(_) => StatusCode::CONFLICT,
            BillbusterError::InvalidTransaction { .. }
            | BillbusterError::EmptyMembers { .. }
            | BillbusterError::BalanceOverflow => StatusCode::UNPROCESSABLE_ENTITY,
            BillbusterError::StorageError(_)
            | BillbusterError::NotificationError(_)
            | BillbusterError::AuthError(_)
            | BillbusterError::ConfigError(_)
            | BillbusterError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match self.0 {
            BillbusterError::InvalidInput(_, detail) => detail.description,
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %error_message, "Request failed");
        }
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
