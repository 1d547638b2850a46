use serde::{Deserialize, Serialize};

/// A sellable item on a tenant's menu.
///
/// Prices are stored as f64 on the wire; all arithmetic on them happens
/// through Decimal in the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub base_price: f64,
    /// Percentage, e.g. 10.0 means 10%.
    pub tax_rate: f64,
    #[serde(default)]
    pub variants: Vec<MenuVariant>,
    #[serde(default)]
    pub modifiers: Vec<MenuModifier>,
    pub is_active: bool,
    /// Soft availability toggle (sold out), separate from is_active.
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A size/style variant. Its price replaces the base price entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuVariant {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
}

/// An add-on whose price is added on top of the item price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuModifier {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
}

impl MenuItem {
    pub fn variant(&self, variant_id: i64) -> Option<&MenuVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn modifier(&self, modifier_id: i64) -> Option<&MenuModifier> {
        self.modifiers.iter().find(|m| m.id == modifier_id)
    }
}
