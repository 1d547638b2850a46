//! Order API: one route per command plus read-side queries.
//!
//! Commands return the wire-level `CommandResponse`; its error code
//! also picks the HTTP status so gateways can route on it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use shared::order::{
    CommandResponse, OrderCommand, OrderCommandPayload, OrderEvent, OrderItemInput, OrderSnapshot,
    OrderStatus, OrderType, PaymentInput,
};

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::utils::{status_for, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(open_order).get(list_active))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/events", get(get_events))
        .route("/api/orders/{id}/items", post(add_items))
        .route("/api/orders/{id}/confirm", post(confirm))
        .route("/api/orders/{id}/prepare", post(prepare))
        .route("/api/orders/{id}/ready", post(ready))
        .route("/api/orders/{id}/serve", post(serve))
        .route("/api/orders/{id}/complete", post(complete))
        .route("/api/orders/{id}/cancel", post(cancel))
        .route("/api/orders/{id}/payments", post(add_payment))
        .route("/api/orders/{id}/refund", post(refund))
        .route("/api/orders/{id}/charges", post(set_charges))
}

/// Build a command, honoring a client-supplied idempotency key.
fn command(
    ctx: &RequestContext,
    command_id: Option<String>,
    payload: OrderCommandPayload,
) -> OrderCommand {
    let mut cmd = OrderCommand::new(
        ctx.tenant_id,
        ctx.operator_id.clone(),
        ctx.operator_name.clone(),
        payload,
    );
    if let Some(id) = command_id {
        cmd.command_id = id;
    }
    cmd
}

/// Map the command outcome onto an HTTP status.
fn respond(response: CommandResponse) -> impl IntoResponse {
    let status = match &response.error {
        Some(error) => status_for(error.code),
        None => StatusCode::OK,
    };
    (status, Json(response))
}

// ========== Commands ==========

#[derive(Debug, Deserialize)]
pub struct OpenOrderRequest {
    pub command_id: Option<String>,
    pub order_type: OrderType,
    pub table_id: Option<i64>,
    pub guest_count: Option<i32>,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

async fn open_order(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Json(req): Json<OpenOrderRequest>,
) -> impl IntoResponse {
    let cmd = command(
        &ctx,
        req.command_id,
        OrderCommandPayload::OpenOrder {
            order_type: req.order_type,
            table_id: req.table_id,
            guest_count: req.guest_count,
            items: req.items,
        },
    );
    respond(state.orders.execute_command(cmd))
}

#[derive(Debug, Deserialize)]
pub struct AddItemsRequest {
    pub command_id: Option<String>,
    pub items: Vec<OrderItemInput>,
}

async fn add_items(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
    Json(req): Json<AddItemsRequest>,
) -> impl IntoResponse {
    let cmd = command(
        &ctx,
        req.command_id,
        OrderCommandPayload::AddItems {
            order_id,
            items: req.items,
        },
    );
    respond(state.orders.execute_command(cmd))
}

/// Body for transition commands that carry nothing but the key.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    pub command_id: Option<String>,
}

macro_rules! transition_handler {
    ($name:ident, $variant:ident) => {
        async fn $name(
            State(state): State<ServerState>,
            ctx: RequestContext,
            Path(order_id): Path<String>,
            body: Option<Json<TransitionRequest>>,
        ) -> impl IntoResponse {
            let req = body.map(|Json(req)| req).unwrap_or_default();
            let cmd = command(
                &ctx,
                req.command_id,
                OrderCommandPayload::$variant { order_id },
            );
            respond(state.orders.execute_command(cmd))
        }
    };
}

transition_handler!(confirm, ConfirmOrder);
transition_handler!(prepare, StartPreparing);
transition_handler!(ready, MarkReady);
transition_handler!(serve, MarkServed);
transition_handler!(complete, CompleteOrder);

#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub command_id: Option<String>,
    pub reason: String,
}

async fn cancel(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
    Json(req): Json<ReasonRequest>,
) -> impl IntoResponse {
    let cmd = command(
        &ctx,
        req.command_id,
        OrderCommandPayload::CancelOrder {
            order_id,
            reason: req.reason,
        },
    );
    respond(state.orders.execute_command(cmd))
}

async fn refund(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
    Json(req): Json<ReasonRequest>,
) -> impl IntoResponse {
    let cmd = command(
        &ctx,
        req.command_id,
        OrderCommandPayload::RefundOrder {
            order_id,
            reason: req.reason,
        },
    );
    respond(state.orders.execute_command(cmd))
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub command_id: Option<String>,
    #[serde(flatten)]
    pub payment: PaymentInput,
}

async fn add_payment(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> impl IntoResponse {
    let cmd = command(
        &ctx,
        req.command_id,
        OrderCommandPayload::AddPayment {
            order_id,
            payment: req.payment,
        },
    );
    respond(state.orders.execute_command(cmd))
}

#[derive(Debug, Deserialize)]
pub struct ChargesRequest {
    pub command_id: Option<String>,
    pub service_charge: Option<f64>,
    pub discount: Option<f64>,
}

async fn set_charges(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
    Json(req): Json<ChargesRequest>,
) -> impl IntoResponse {
    let cmd = command(
        &ctx,
        req.command_id,
        OrderCommandPayload::SetCharges {
            order_id,
            service_charge: req.service_charge,
            discount: req.discount,
        },
    );
    respond(state.orders.execute_command(cmd))
}

// ========== Queries ==========

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
}

async fn list_active(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderSnapshot>>> {
    let mut orders = state.orders.get_active_orders(ctx.tenant_id)?;
    if let Some(status) = query.status {
        orders.retain(|o| o.status == status);
    }
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
) -> AppResult<Json<OrderSnapshot>> {
    Ok(Json(state.orders.get_order(ctx.tenant_id, &order_id)?))
}

async fn get_events(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<OrderEvent>>> {
    Ok(Json(
        state.orders.get_events_for_order(ctx.tenant_id, &order_id)?,
    ))
}
