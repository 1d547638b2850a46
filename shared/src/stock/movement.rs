use serde::{Deserialize, Serialize};

/// Why stock changed. The kind fixes the sign of the effect, except
/// Adjustment which carries an explicit direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Purchase/delivery, increases stock.
    In,
    /// Manual removal, decreases stock.
    Out,
    /// Stocktake correction, direction chosen by the operator.
    Adjustment,
    /// Spoilage, decreases stock.
    Waste,
    /// Automatic deduction when an order enters preparation. Only the
    /// order pipeline may record these.
    OrderDeduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

/// One immutable ledger entry. `signed_effect` already carries the
/// sign, and `resulting_stock` is the level right after applying it,
/// so any prefix of the ledger replays to a known level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    /// Tenant-wide monotonic sequence number.
    pub id: u64,
    pub tenant_id: i64,
    pub ingredient_id: i64,
    pub kind: MovementKind,
    pub signed_effect: f64,
    pub resulting_stock: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    /// Free-form link, e.g. an order number or supplier invoice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub operator_id: String,
    pub operator_name: String,
    pub created_at: i64,
}

/// A requested manual movement. Quantity is always a positive
/// magnitude; the kind (and direction, for adjustments) sets the sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementInput {
    pub ingredient_id: i64,
    pub kind: MovementKind,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<AdjustmentDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}
