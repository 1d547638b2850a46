//! Stock API: manual movements and ledger queries.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use shared::models::Ingredient;
use shared::stock::{MovementInput, StockMovement};

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::stock::StockVerification;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/stock/movements", post(record_movement).get(list_movements))
        .route(
            "/api/stock/ingredients/{id}/movements",
            get(ingredient_movements),
        )
        .route("/api/stock/ingredients/{id}/verify", get(verify_ingredient))
        .route("/api/stock/low", get(low_stock))
}

async fn record_movement(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Json(input): Json<MovementInput>,
) -> AppResult<Json<StockMovement>> {
    let movement = state.ledger.record_movement(
        ctx.tenant_id,
        &input,
        &ctx.operator_id,
        &ctx.operator_name,
    )?;
    Ok(Json(movement))
}

async fn list_movements(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<StockMovement>>> {
    Ok(Json(state.ledger.movements(ctx.tenant_id)?))
}

async fn ingredient_movements(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(ingredient_id): Path<i64>,
) -> AppResult<Json<Vec<StockMovement>>> {
    Ok(Json(
        state
            .ledger
            .movements_for_ingredient(ctx.tenant_id, ingredient_id)?,
    ))
}

/// Replay the ledger and compare it with the cached stock level.
async fn verify_ingredient(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(ingredient_id): Path<i64>,
) -> AppResult<Json<StockVerification>> {
    Ok(Json(state.ledger.verify(ctx.tenant_id, ingredient_id)?))
}

async fn low_stock(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<Ingredient>>> {
    Ok(Json(state.ledger.low_stock(ctx.tenant_id)?))
}
