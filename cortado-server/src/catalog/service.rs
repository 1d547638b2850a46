//! Catalog service with read-through caches.
//!
//! Menu items, recipes, tables and tenants are cached in DashMaps and
//! invalidated on write. Ingredients are deliberately NOT cached: the
//! stock ledger mutates their cached stock level inside command
//! transactions, and a stale ingredient here would show phantom stock.

use std::collections::HashMap;

use dashmap::DashMap;
use thiserror::Error;

use shared::models::{DiningTable, Ingredient, MenuItem, Recipe, Tenant};
use shared::stock::{MovementKind, StockMovement};
use shared::util;

use crate::storage::{PosStorage, StorageError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tenant mismatch: {0} belongs to another tenant")]
    TenantMismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

pub struct CatalogService {
    storage: PosStorage,
    tenants: DashMap<i64, Tenant>,
    menu_items: DashMap<i64, MenuItem>,
    recipes: DashMap<i64, Vec<Recipe>>,
    tables: DashMap<i64, DiningTable>,
}

impl CatalogService {
    pub fn new(storage: PosStorage) -> Self {
        Self {
            storage,
            tenants: DashMap::new(),
            menu_items: DashMap::new(),
            recipes: DashMap::new(),
            tables: DashMap::new(),
        }
    }

    /// Load the persisted catalog into the caches at startup.
    pub fn warmup(&self) -> CatalogResult<()> {
        for tenant in self.storage.get_all_tenants()? {
            for item in self.storage.get_menu_items(tenant.id)? {
                self.recipes
                    .insert(item.id, self.storage.get_recipes(item.id)?);
                self.menu_items.insert(item.id, item);
            }
            for table in self.storage.get_dining_tables(tenant.id)? {
                self.tables.insert(table.id, table);
            }
            self.tenants.insert(tenant.id, tenant);
        }
        tracing::info!(
            tenants = self.tenants.len(),
            menu_items = self.menu_items.len(),
            tables = self.tables.len(),
            "Catalog cache warmed up"
        );
        Ok(())
    }

    // ========== Tenants ==========

    pub fn create_tenant(
        &self,
        name: String,
        subscription_plan: String,
        timezone: String,
    ) -> CatalogResult<Tenant> {
        if timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(CatalogError::InvalidInput(format!(
                "unknown timezone {timezone}"
            )));
        }
        let tenant = Tenant {
            id: util::snowflake_id(),
            name,
            subscription_plan,
            timezone,
            is_active: true,
            created_at: util::now_millis(),
        };
        self.storage.store_tenant(&tenant)?;
        self.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    pub fn tenant(&self, tenant_id: i64) -> CatalogResult<Tenant> {
        if let Some(tenant) = self.tenants.get(&tenant_id) {
            return Ok(tenant.clone());
        }
        let tenant = self
            .storage
            .get_tenant(tenant_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("tenant {tenant_id}")))?;
        self.tenants.insert(tenant_id, tenant.clone());
        Ok(tenant)
    }

    // ========== Menu Items ==========

    #[allow(clippy::too_many_arguments)]
    pub fn create_menu_item(
        &self,
        tenant_id: i64,
        name: String,
        base_price: f64,
        tax_rate: f64,
        variants: Vec<shared::models::MenuVariant>,
        modifiers: Vec<shared::models::MenuModifier>,
    ) -> CatalogResult<MenuItem> {
        self.tenant(tenant_id)?;
        if !base_price.is_finite() || base_price < 0.0 {
            return Err(CatalogError::InvalidInput(format!(
                "base price must be non-negative, got {base_price}"
            )));
        }
        if !tax_rate.is_finite() || !(0.0..=100.0).contains(&tax_rate) {
            return Err(CatalogError::InvalidInput(format!(
                "tax rate must be between 0 and 100, got {tax_rate}"
            )));
        }

        let now = util::now_millis();
        let item = MenuItem {
            id: util::snowflake_id(),
            tenant_id,
            name,
            base_price,
            tax_rate,
            variants,
            modifiers,
            is_active: true,
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        self.storage.store_menu_item(&item)?;
        self.menu_items.insert(item.id, item.clone());
        Ok(item)
    }

    pub fn menu_item(&self, tenant_id: i64, item_id: i64) -> CatalogResult<MenuItem> {
        let item = if let Some(item) = self.menu_items.get(&item_id) {
            item.clone()
        } else {
            let item = self
                .storage
                .get_menu_item(item_id)?
                .ok_or_else(|| CatalogError::NotFound(format!("menu item {item_id}")))?;
            self.menu_items.insert(item_id, item.clone());
            item
        };
        if item.tenant_id != tenant_id {
            return Err(CatalogError::TenantMismatch(format!("menu item {item_id}")));
        }
        Ok(item)
    }

    /// Resolve a set of menu items for freezing order lines.
    pub fn menu_items_for(
        &self,
        tenant_id: i64,
        item_ids: impl IntoIterator<Item = i64>,
    ) -> CatalogResult<HashMap<i64, MenuItem>> {
        let mut resolved = HashMap::new();
        for item_id in item_ids {
            if resolved.contains_key(&item_id) {
                continue;
            }
            resolved.insert(item_id, self.menu_item(tenant_id, item_id)?);
        }
        Ok(resolved)
    }

    pub fn list_menu_items(&self, tenant_id: i64) -> CatalogResult<Vec<MenuItem>> {
        Ok(self.storage.get_menu_items(tenant_id)?)
    }

    /// Toggle the sold-out flag.
    pub fn set_availability(
        &self,
        tenant_id: i64,
        item_id: i64,
        is_available: bool,
    ) -> CatalogResult<MenuItem> {
        let mut item = self.menu_item(tenant_id, item_id)?;
        item.is_available = is_available;
        item.updated_at = util::now_millis();
        self.storage.store_menu_item(&item)?;
        self.menu_items.insert(item.id, item.clone());
        Ok(item)
    }

    // ========== Ingredients ==========

    /// Create an ingredient. Stock starts at zero; any initial quantity
    /// is booked as an `In` movement in the same transaction, so the
    /// cached level is always the sum of ledger entries.
    #[allow(clippy::too_many_arguments)]
    pub fn create_ingredient(
        &self,
        tenant_id: i64,
        name: String,
        unit: String,
        initial_stock: f64,
        minimum_stock: f64,
        cost_per_unit: f64,
    ) -> CatalogResult<Ingredient> {
        self.tenant(tenant_id)?;
        for (value, field) in [
            (initial_stock, "initial stock"),
            (minimum_stock, "minimum stock"),
            (cost_per_unit, "cost per unit"),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CatalogError::InvalidInput(format!(
                    "{field} must be non-negative, got {value}"
                )));
            }
        }

        let now = util::now_millis();
        let mut ingredient = Ingredient {
            id: util::snowflake_id(),
            tenant_id,
            name,
            unit,
            current_stock: 0.0,
            minimum_stock,
            cost_per_unit,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        if initial_stock > 0.0 {
            let movement = StockMovement {
                id: self.storage.next_movement_id_txn(&txn)?,
                tenant_id,
                ingredient_id: ingredient.id,
                kind: MovementKind::In,
                signed_effect: initial_stock,
                resulting_stock: initial_stock,
                unit_cost: Some(cost_per_unit),
                reference: None,
                operator_id: "system".to_string(),
                operator_name: "system".to_string(),
                created_at: now,
            };
            self.storage.store_movement(&txn, &movement)?;
            ingredient.current_stock = initial_stock;
        }
        self.storage.store_ingredient_txn(&txn, &ingredient)?;
        txn.commit().map_err(StorageError::from)?;

        Ok(ingredient)
    }

    pub fn ingredient(&self, tenant_id: i64, ingredient_id: i64) -> CatalogResult<Ingredient> {
        let ingredient = self
            .storage
            .get_ingredient(ingredient_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("ingredient {ingredient_id}")))?;
        if ingredient.tenant_id != tenant_id {
            return Err(CatalogError::TenantMismatch(format!(
                "ingredient {ingredient_id}"
            )));
        }
        Ok(ingredient)
    }

    pub fn list_ingredients(&self, tenant_id: i64) -> CatalogResult<Vec<Ingredient>> {
        Ok(self.storage.get_ingredients(tenant_id)?)
    }

    // ========== Recipes ==========

    /// Replace the recipe of one menu item.
    pub fn set_recipes(
        &self,
        tenant_id: i64,
        menu_item_id: i64,
        lines: Vec<Recipe>,
    ) -> CatalogResult<Vec<Recipe>> {
        self.menu_item(tenant_id, menu_item_id)?;
        for line in &lines {
            if line.menu_item_id != menu_item_id {
                return Err(CatalogError::InvalidInput(format!(
                    "recipe line targets menu item {}, expected {}",
                    line.menu_item_id, menu_item_id
                )));
            }
            if !line.quantity_needed.is_finite() || line.quantity_needed <= 0.0 {
                return Err(CatalogError::InvalidInput(format!(
                    "quantity needed must be positive, got {}",
                    line.quantity_needed
                )));
            }
            // The ingredient must exist and belong to the same tenant
            self.ingredient(tenant_id, line.ingredient_id)?;
        }

        self.storage.store_recipes(menu_item_id, &lines)?;
        self.recipes.insert(menu_item_id, lines.clone());
        Ok(lines)
    }

    pub fn recipes_for(&self, menu_item_id: i64) -> CatalogResult<Vec<Recipe>> {
        if let Some(recipes) = self.recipes.get(&menu_item_id) {
            return Ok(recipes.clone());
        }
        let recipes = self.storage.get_recipes(menu_item_id)?;
        self.recipes.insert(menu_item_id, recipes.clone());
        Ok(recipes)
    }

    // ========== Dining Tables ==========

    pub fn create_dining_table(
        &self,
        tenant_id: i64,
        name: String,
        capacity: i32,
    ) -> CatalogResult<DiningTable> {
        self.tenant(tenant_id)?;
        if capacity <= 0 {
            return Err(CatalogError::InvalidInput(format!(
                "capacity must be positive, got {capacity}"
            )));
        }
        let table = DiningTable {
            id: util::snowflake_id(),
            tenant_id,
            name,
            capacity,
            is_active: true,
            created_at: util::now_millis(),
        };
        self.storage.store_dining_table(&table)?;
        self.tables.insert(table.id, table.clone());
        Ok(table)
    }

    pub fn dining_table(&self, tenant_id: i64, table_id: i64) -> CatalogResult<DiningTable> {
        let table = if let Some(table) = self.tables.get(&table_id) {
            table.clone()
        } else {
            let table = self
                .storage
                .get_dining_table(table_id)?
                .ok_or_else(|| CatalogError::NotFound(format!("table {table_id}")))?;
            self.tables.insert(table_id, table.clone());
            table
        };
        if table.tenant_id != tenant_id {
            return Err(CatalogError::TenantMismatch(format!("table {table_id}")));
        }
        Ok(table)
    }

    pub fn list_dining_tables(&self, tenant_id: i64) -> CatalogResult<Vec<DiningTable>> {
        Ok(self.storage.get_dining_tables(tenant_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CatalogService {
        CatalogService::new(PosStorage::open_in_memory().unwrap())
    }

    fn tenant(service: &CatalogService) -> Tenant {
        service
            .create_tenant(
                "Cafe Central".to_string(),
                "standard".to_string(),
                "Europe/Lisbon".to_string(),
            )
            .unwrap()
    }

    #[test]
    fn test_create_tenant_rejects_bad_timezone() {
        let service = service();
        let result = service.create_tenant(
            "Cafe".to_string(),
            "standard".to_string(),
            "Mars/Olympus".to_string(),
        );
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
    }

    #[test]
    fn test_menu_item_tenant_isolation() {
        let service = service();
        let t1 = tenant(&service);
        let t2 = tenant(&service);

        let item = service
            .create_menu_item(t1.id, "Latte".to_string(), 3.5, 10.0, vec![], vec![])
            .unwrap();

        assert!(service.menu_item(t1.id, item.id).is_ok());
        assert!(matches!(
            service.menu_item(t2.id, item.id),
            Err(CatalogError::TenantMismatch(_))
        ));
    }

    #[test]
    fn test_set_recipes_validates_lines() {
        let service = service();
        let t = tenant(&service);
        let item = service
            .create_menu_item(t.id, "Latte".to_string(), 3.5, 10.0, vec![], vec![])
            .unwrap();
        let beans = service
            .create_ingredient(t.id, "Beans".to_string(), "g".to_string(), 1000.0, 100.0, 0.02)
            .unwrap();

        // Positive quantities pass
        let lines = vec![Recipe {
            menu_item_id: item.id,
            ingredient_id: beans.id,
            quantity_needed: 18.0,
        }];
        assert!(service.set_recipes(t.id, item.id, lines).is_ok());

        // Zero quantity fails
        let bad = vec![Recipe {
            menu_item_id: item.id,
            ingredient_id: beans.id,
            quantity_needed: 0.0,
        }];
        assert!(matches!(
            service.set_recipes(t.id, item.id, bad),
            Err(CatalogError::InvalidInput(_))
        ));

        // Unknown ingredient fails
        let missing = vec![Recipe {
            menu_item_id: item.id,
            ingredient_id: 999,
            quantity_needed: 1.0,
        }];
        assert!(matches!(
            service.set_recipes(t.id, item.id, missing),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_ingredient_books_initial_stock_as_movement() {
        let storage = PosStorage::open_in_memory().unwrap();
        let service = CatalogService::new(storage.clone());
        let t = tenant(&service);

        let beans = service
            .create_ingredient(t.id, "Beans".to_string(), "g".to_string(), 500.0, 100.0, 0.02)
            .unwrap();
        assert_eq!(beans.current_stock, 500.0);

        let movements = storage.get_movements(t.id).unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].ingredient_id, beans.id);
        assert_eq!(movements[0].kind, MovementKind::In);
        assert_eq!(movements[0].signed_effect, 500.0);
        assert_eq!(movements[0].resulting_stock, 500.0);

        // No quantity, no ledger entry
        let empty = service
            .create_ingredient(t.id, "Syrup".to_string(), "ml".to_string(), 0.0, 0.0, 0.01)
            .unwrap();
        assert_eq!(empty.current_stock, 0.0);
        assert_eq!(storage.get_movements(t.id).unwrap().len(), 1);
        assert!(storage
            .get_movements(t.id)
            .unwrap()
            .iter()
            .all(|m| m.ingredient_id != empty.id));
    }

    #[test]
    fn test_set_availability_round_trip() {
        let service = service();
        let t = tenant(&service);
        let item = service
            .create_menu_item(t.id, "Latte".to_string(), 3.5, 10.0, vec![], vec![])
            .unwrap();

        let updated = service.set_availability(t.id, item.id, false).unwrap();
        assert!(!updated.is_available);
        assert!(!service.menu_item(t.id, item.id).unwrap().is_available);
    }

    #[test]
    fn test_warmup_reloads_from_storage() {
        let storage = PosStorage::open_in_memory().unwrap();
        let service = CatalogService::new(storage.clone());
        let t = tenant(&service);
        let item = service
            .create_menu_item(t.id, "Latte".to_string(), 3.5, 10.0, vec![], vec![])
            .unwrap();

        // A fresh service over the same storage starts cold
        let fresh = CatalogService::new(storage);
        fresh.warmup().unwrap();
        assert_eq!(fresh.menu_item(t.id, item.id).unwrap().name, "Latte");
    }
}
