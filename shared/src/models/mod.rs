//! Catalog models: tenants, menu items, ingredients, recipes, tables.

mod dining_table;
mod ingredient;
mod menu_item;
mod recipe;
mod tenant;

pub use dining_table::DiningTable;
pub use ingredient::Ingredient;
pub use menu_item::{MenuItem, MenuModifier, MenuVariant};
pub use recipe::Recipe;
pub use tenant::Tenant;
