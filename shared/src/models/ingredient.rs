use serde::{Deserialize, Serialize};

/// A stock-tracked ingredient.
///
/// `current_stock` is a cached projection of the movement ledger; the
/// ledger is the source of truth and can rebuild this value by replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    /// Unit of measure, e.g. "g", "ml", "unit".
    pub unit: String,
    pub current_stock: f64,
    pub minimum_stock: f64,
    pub cost_per_unit: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Ingredient {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(current: f64, minimum: f64) -> Ingredient {
        Ingredient {
            id: 1,
            tenant_id: 1,
            name: "Espresso beans".to_string(),
            unit: "g".to_string(),
            current_stock: current,
            minimum_stock: minimum,
            cost_per_unit: 0.02,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_low_stock_at_threshold() {
        assert!(ingredient(500.0, 500.0).is_low_stock());
    }

    #[test]
    fn test_not_low_stock_above_threshold() {
        assert!(!ingredient(501.0, 500.0).is_low_stock());
    }
}
