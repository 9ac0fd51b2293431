use utoipa::OpenApi;

use crate::{
    api::models::{
        AddMemberRequest, BalanceResponse, CreateGroupRequest, CreateGroupResponse, ErrorResponse, GroupResponse,
        GroupsResponse, RemindersResponse, SaveTransactionRequest, SaveTransactionResponse, ScanResponse,
        SendNotificationRequest, SendNotificationResponse, SendReminderRequest, SuccessResponse, TransactionsResponse,
    },
    core::{
        models::{
            group::Group,
            reminder::{Reminder, ReminderStatus},
        },
        services::{ScannedBill, ScannedItem},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::scan_bill,
        super::handlers::save_transaction,
        super::handlers::get_balance,
        super::handlers::get_line_item_balance,
        super::handlers::get_groups,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::get_group_transactions,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::send_reminder,
        super::handlers::get_reminders,
        super::handlers::send_notification
    ),
    components(schemas(
        SaveTransactionRequest,
        CreateGroupRequest,
        AddMemberRequest,
        SendReminderRequest,
        SendNotificationRequest,
        SuccessResponse,
        ScanResponse,
        SaveTransactionResponse,
        BalanceResponse,
        TransactionsResponse,
        GroupsResponse,
        CreateGroupResponse,
        GroupResponse,
        RemindersResponse,
        SendNotificationResponse,
        ErrorResponse,
        ScannedBill,
        ScannedItem,
        Group,
        Reminder,
        ReminderStatus
    )),
    info(
        title = "Billbuster API",
        description = "API for splitting shared bills, tracking group balances and sending payment reminders",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
