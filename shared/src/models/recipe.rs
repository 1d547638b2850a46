use serde::{Deserialize, Serialize};

/// One line of a menu item's recipe: how much of an ingredient a single
/// unit of the item consumes. The full recipe for a menu item is the
/// set of its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub menu_item_id: i64,
    pub ingredient_id: i64,
    /// Quantity per single item sold, in the ingredient's unit.
    pub quantity_needed: f64,
}
