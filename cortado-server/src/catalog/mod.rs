//! Catalog management: tenants, menu, ingredients, recipes, tables.

mod service;

pub use service::{CatalogError, CatalogService};
