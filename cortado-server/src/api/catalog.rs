//! Catalog API: the minimal CRUD surface the order core needs seeded.

use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;

use shared::models::{DiningTable, Ingredient, MenuItem, MenuModifier, MenuVariant, Recipe, Tenant};

use crate::api::context::RequestContext;
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/tenants", post(create_tenant))
        .route(
            "/api/catalog/menu-items",
            post(create_menu_item).get(list_menu_items),
        )
        .route(
            "/api/catalog/menu-items/{id}/recipes",
            put(set_recipes).get(get_recipes),
        )
        .route(
            "/api/catalog/menu-items/{id}/availability",
            put(set_availability),
        )
        .route(
            "/api/catalog/ingredients",
            post(create_ingredient).get(list_ingredients),
        )
        .route("/api/catalog/tables", post(create_table).get(list_tables))
}

// ========== Tenants ==========

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default = "default_plan")]
    pub subscription_plan: String,
    /// IANA timezone; the server default applies when omitted.
    pub timezone: Option<String>,
}

fn default_plan() -> String {
    "standard".to_string()
}

/// Tenant creation is not tenant-scoped; it is how a tenant comes to be.
async fn create_tenant(
    State(state): State<ServerState>,
    Json(req): Json<CreateTenantRequest>,
) -> AppResult<Json<Tenant>> {
    let timezone = req
        .timezone
        .unwrap_or_else(|| state.config.timezone.name().to_string());
    let tenant = state
        .catalog
        .create_tenant(req.name, req.subscription_plan, timezone)?;
    Ok(Json(tenant))
}

// ========== Menu Items ==========

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub base_price: f64,
    pub tax_rate: f64,
    #[serde(default)]
    pub variants: Vec<MenuVariant>,
    #[serde(default)]
    pub modifiers: Vec<MenuModifier>,
}

async fn create_menu_item(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Json(req): Json<CreateMenuItemRequest>,
) -> AppResult<Json<MenuItem>> {
    let item = state.catalog.create_menu_item(
        ctx.tenant_id,
        req.name,
        req.base_price,
        req.tax_rate,
        req.variants,
        req.modifiers,
    )?;
    Ok(Json(item))
}

async fn list_menu_items(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<MenuItem>>> {
    Ok(Json(state.catalog.list_menu_items(ctx.tenant_id)?))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

async fn set_availability(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(item_id): Path<i64>,
    Json(req): Json<AvailabilityRequest>,
) -> AppResult<Json<MenuItem>> {
    let item = state
        .catalog
        .set_availability(ctx.tenant_id, item_id, req.is_available)?;
    Ok(Json(item))
}

// ========== Recipes ==========

#[derive(Debug, Deserialize)]
pub struct RecipeLineRequest {
    pub ingredient_id: i64,
    pub quantity_needed: f64,
}

/// Replace the full recipe of one menu item.
async fn set_recipes(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(item_id): Path<i64>,
    Json(lines): Json<Vec<RecipeLineRequest>>,
) -> AppResult<Json<Vec<Recipe>>> {
    let recipes = lines
        .into_iter()
        .map(|line| Recipe {
            menu_item_id: item_id,
            ingredient_id: line.ingredient_id,
            quantity_needed: line.quantity_needed,
        })
        .collect();
    Ok(Json(state.catalog.set_recipes(ctx.tenant_id, item_id, recipes)?))
}

async fn get_recipes(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Vec<Recipe>>> {
    // Tenant scoping rides on the menu item lookup
    state.catalog.menu_item(ctx.tenant_id, item_id)?;
    Ok(Json(state.catalog.recipes_for(item_id)?))
}

// ========== Ingredients ==========

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub initial_stock: f64,
    #[serde(default)]
    pub minimum_stock: f64,
    #[serde(default)]
    pub cost_per_unit: f64,
}

async fn create_ingredient(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Json(req): Json<CreateIngredientRequest>,
) -> AppResult<Json<Ingredient>> {
    let ingredient = state.catalog.create_ingredient(
        ctx.tenant_id,
        req.name,
        req.unit,
        req.initial_stock,
        req.minimum_stock,
        req.cost_per_unit,
    )?;
    Ok(Json(ingredient))
}

async fn list_ingredients(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<Ingredient>>> {
    Ok(Json(state.catalog.list_ingredients(ctx.tenant_id)?))
}

// ========== Dining Tables ==========

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
    pub capacity: i32,
}

async fn create_table(
    State(state): State<ServerState>,
    ctx: RequestContext,
    Json(req): Json<CreateTableRequest>,
) -> AppResult<Json<DiningTable>> {
    let table = state
        .catalog
        .create_dining_table(ctx.tenant_id, req.name, req.capacity)?;
    Ok(Json(table))
}

async fn list_tables(
    State(state): State<ServerState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<DiningTable>>> {
    Ok(Json(state.catalog.list_dining_tables(ctx.tenant_id)?))
}
