use crate::{
    api::models::*,
    core::services::BillbusterService,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::{delete, get, post},
};
use std::sync::Arc;

pub type SharedService = Arc<BillbusterService>;

pub fn api_routes(service: SharedService) -> Router {
    Router::new()
        .route("/scan", post(scan_bill))
        .route("/save-transaction", post(save_transaction))
        .route("/balance/{group_id}", get(get_balance))
        .route("/balance/{group_id}/line-items", get(get_line_item_balance))
        .route("/groups", get(get_groups).post(create_group))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/transactions", get(get_group_transactions))
        .route("/groups/{group_id}/members", post(add_member))
        .route("/groups/{group_id}/members/{user_id}", delete(remove_member))
        .route("/send-reminder", post(send_reminder))
        .route("/reminders", get(get_reminders))
        .route("/send-notification", post(send_notification))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/scan",
    responses(
        (status = 200, description = "Scanned bill (placeholder data)", body = ScanResponse)
    )
)]
pub async fn scan_bill(State(service): State<SharedService>) -> Json<ScanResponse> {
    Json(ScanResponse {
        success: true,
        data: service.scan_bill(),
    })
}

#[utoipa::path(
    post,
    path = "/api/save-transaction",
    request_body = SaveTransactionRequest,
    responses(
        (status = 200, description = "Transaction saved", body = SaveTransactionResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn save_transaction(
    State(service): State<SharedService>,
    payload: Result<Json<SaveTransactionRequest>, JsonRejection>,
) -> Result<Json<SaveTransactionResponse>, ApiError> {
    let Json(req) = payload?;
    let transaction_id = service.save_transaction(req.group_id, req.bill_data).await?;
    Ok(Json(SaveTransactionResponse {
        success: true,
        transaction_id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/balance/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Even-split balances per participant", body = BalanceResponse),
        (status = 400, description = "Invalid group id", body = ErrorResponse),
        (status = 422, description = "A stored transaction cannot be split", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn get_balance(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balances = service.get_balances(&group_id).await?;
    Ok(Json(BalanceResponse::try_from(balances)?))
}

#[utoipa::path(
    get,
    path = "/api/balance/{group_id}/line-items",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Gross amount paid per participant on itemized bills", body = BalanceResponse),
        (status = 400, description = "Invalid group id", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn get_line_item_balance(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let totals = service.get_line_item_totals(&group_id).await?;
    Ok(Json(BalanceResponse::try_from(totals)?))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    params(UserGroupsQuery),
    responses(
        (status = 200, description = "Groups the user belongs to", body = GroupsResponse),
        (status = 400, description = "Missing userId parameter", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn get_groups(
    State(service): State<SharedService>,
    Query(query): Query<UserGroupsQuery>,
) -> Result<Json<GroupsResponse>, ApiError> {
    let groups = service.get_user_groups(query.user_id).await?;
    Ok(Json(GroupsResponse { success: true, groups }))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created", body = CreateGroupResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn create_group(
    State(service): State<SharedService>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<Json<CreateGroupResponse>, ApiError> {
    let Json(req) = payload?;
    let group = service.create_group(req.name, req.members).await?;
    Ok(Json(CreateGroupResponse {
        success: true,
        group_id: group.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group retrieved", body = GroupResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn get_group(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = service.get_group(&group_id).await?;
    Ok(Json(GroupResponse { success: true, group }))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/transactions",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Stored transaction documents", body = TransactionsResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn get_group_transactions(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let transactions = service.get_group_transactions(&group_id).await?;
    Ok(Json(TransactionsResponse {
        success: true,
        transactions,
    }))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    request_body = AddMemberRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Member added", body = GroupResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "User already a member", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn add_member(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> Result<Json<GroupResponse>, ApiError> {
    let Json(req) = payload?;
    let group = service.add_member(&group_id, req.user_id).await?;
    Ok(Json(GroupResponse { success: true, group }))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/members/{user_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("user_id" = String, Path, description = "Member to remove")
    ),
    responses(
        (status = 200, description = "Member removed", body = GroupResponse),
        (status = 400, description = "Cannot remove last member", body = ErrorResponse),
        (status = 404, description = "Group not found or user not a member", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn remove_member(
    State(service): State<SharedService>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = service.remove_member(&group_id, &user_id).await?;
    Ok(Json(GroupResponse { success: true, group }))
}

#[utoipa::path(
    post,
    path = "/api/send-reminder",
    request_body = SendReminderRequest,
    responses(
        (status = 200, description = "Reminder stored as pending", body = SuccessResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn send_reminder(
    State(service): State<SharedService>,
    payload: Result<Json<SendReminderRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    service.send_reminder(req.recipient_id, req.amount, req.message).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/api/reminders",
    params(RemindersQuery),
    responses(
        (status = 200, description = "Pending reminders", body = RemindersResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn get_reminders(
    State(service): State<SharedService>,
    Query(query): Query<RemindersQuery>,
) -> Result<Json<RemindersResponse>, ApiError> {
    let reminders = service.get_pending_reminders(query.recipient_id).await?;
    Ok(Json(RemindersResponse {
        success: true,
        reminders,
    }))
}

#[utoipa::path(
    post,
    path = "/api/send-notification",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Notification dispatched", body = SendNotificationResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 500, description = "Delivery failed", body = ErrorResponse)
    )
)]
pub async fn send_notification(
    State(service): State<SharedService>,
    payload: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<Json<SendNotificationResponse>, ApiError> {
    let Json(req) = payload?;
    let message_id = service
        .send_notification(req.token, req.title, req.body, req.data)
        .await?;
    Ok(Json(SendNotificationResponse {
        success: true,
        message_id,
    }))
}
