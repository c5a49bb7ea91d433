//! Handlers for the `/returns` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::error::CoreError;
use bazaar_core::order::OrderStatus;
use bazaar_core::returns::{
    check_return_decision, check_return_eligibility, ReturnCheck, ReturnStatus,
};
use bazaar_core::roles::Role;
use bazaar_core::types::DbId;
use bazaar_db::models::return_request::{CreateReturnRequest, ReturnRequest, ReturnWithItem};
use bazaar_db::repositories::{OrderRepo, ReturnRepo};
use bazaar_db::{clamp_limit, clamp_offset};
use bazaar_events::PlatformEvent;
use chrono::Utc;
use serde::Deserialize;

use super::orders::{list_scope, restock, Restock};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, PagedResponse};
use crate::state::AppState;

/// Request body for `POST /returns/request`.
#[derive(Debug, Deserialize)]
pub struct ReturnRequestBody {
    pub order_item_id: DbId,
    pub quantity: i32,
    pub reason: String,
}

/// Query parameters for `GET /returns`.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `PATCH /returns/{id}`.
#[derive(Debug, Deserialize)]
pub struct ReturnDecisionBody {
    pub status: ReturnStatus,
    pub note: Option<String>,
}

/// POST /api/returns/request
///
/// The buyer asks to return units of a delivered order line within the
/// return window.
pub async fn request_return(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ReturnRequestBody>,
) -> AppResult<(StatusCode, Json<DataResponse<ReturnRequest>>)> {
    let mut tx = state.pool.begin().await?;
    let item = OrderRepo::find_item_for_update(&mut tx, input.order_item_id)
        .await?
        .ok_or_else(|| not_found("OrderItem", input.order_item_id))?;
    let order = OrderRepo::find_by_id(&state.pool, item.order_id)
        .await?
        .filter(|o| o.buyer_id == auth.user_id)
        .ok_or_else(|| not_found("OrderItem", input.order_item_id))?;

    // Counted under the line lock, so concurrent requests see each other.
    let already = ReturnRepo::requested_quantity(&mut tx, item.id).await?;
    check_return_eligibility(&ReturnCheck {
        order_status: OrderStatus::parse(&order.status)?,
        delivered_at: order.delivered_at,
        now: Utc::now(),
        window_days: state.config.return_window_days,
        ordered_quantity: item.quantity,
        already_requested: i32::try_from(already).unwrap_or(i32::MAX),
        requested_quantity: input.quantity,
        reason: &input.reason,
    })?;

    let request = ReturnRepo::create(
        &mut tx,
        &CreateReturnRequest {
            order_item_id: item.id,
            buyer_id: auth.user_id,
            quantity: input.quantity,
            reason: input.reason.trim().to_string(),
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        return_id = request.id,
        order_id = order.id,
        order_item_id = item.id,
        quantity = request.quantity,
        "Return requested"
    );
    state.event_bus.publish(PlatformEvent::return_requested(
        request.id,
        &order.order_number,
        &item.product_name,
        auth.user_id,
        item.seller_id,
    ));

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/returns
pub async fn list_returns(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ReturnListParams>,
) -> AppResult<Json<PagedResponse<ReturnWithItem>>> {
    if let Some(status) = params.status.as_deref() {
        ReturnStatus::parse(status)?;
    }
    let (data, total) = ReturnRepo::list(
        &state.pool,
        list_scope(&auth),
        params.status.as_deref(),
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(PagedResponse { data, total }))
}

/// PATCH /api/returns/{id}
///
/// The item's seller or an admin approves or rejects; an admin marks
/// approved returns refunded. Approval puts the units back in stock.
pub async fn decide_return(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReturnDecisionBody>,
) -> AppResult<Json<DataResponse<ReturnRequest>>> {
    let request = ReturnRepo::find_with_item(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("ReturnRequest", id))?;

    let acting_role = match auth.role {
        Role::Admin => Role::Admin,
        Role::Seller if request.seller_id == auth.user_id => Role::Seller,
        _ if request.buyer_id == auth.user_id => Role::Buyer,
        _ => return Err(not_found("ReturnRequest", id)),
    };

    let note = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    if input.status == ReturnStatus::Rejected && note.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "note: a reason is required when rejecting".into(),
        )));
    }

    let mut tx = state.pool.begin().await?;
    let current = ReturnRepo::lock_status(&mut tx, id)
        .await?
        .ok_or_else(|| not_found("ReturnRequest", id))?;
    let from = ReturnStatus::parse(&current)?;
    check_return_decision(from, input.status, acting_role)?;

    let decided = ReturnRepo::decide(&mut tx, id, input.status.as_str(), note, auth.user_id).await?;
    if input.status == ReturnStatus::Approved {
        restock(
            &mut tx,
            &[Restock {
                product_id: request.product_id,
                variant_id: request.variant_id,
                quantity: request.quantity,
            }],
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(
        return_id = id,
        from = from.as_str(),
        to = input.status.as_str(),
        actor_id = auth.user_id,
        "Return decided"
    );
    state.event_bus.publish(PlatformEvent::return_decided(
        id,
        &request.product_name,
        request.buyer_id,
        input.status.as_str(),
        auth.user_id,
    ));

    Ok(Json(DataResponse { data: decided }))
}
