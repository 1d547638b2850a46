//! redb-based storage for the order core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `order_events` | `(order_id, sequence)` | `OrderEvent` | Event stream (append-only) |
//! | `order_snapshots` | `order_id` | `OrderSnapshot` | Snapshot cache |
//! | `active_orders` | `order_id` | `()` | Active order index |
//! | `processed_commands` | `command_id` | `i64` | Idempotency (processed-at millis) |
//! | `counters` | name | `u64` | Sequences and daily order counter |
//! | `stock_movements` | `(tenant_id, id)` | `StockMovement` | Stock ledger (append-only) |
//! | `tenants` | `id` | `Tenant` | Catalog |
//! | `menu_items` | `id` | `MenuItem` | Catalog |
//! | `ingredients` | `id` | `Ingredient` | Catalog + cached stock level |
//! | `recipes` | `menu_item_id` | `Vec<Recipe>` | Catalog |
//! | `dining_tables` | `id` | `DiningTable` | Catalog |
//!
//! # Concurrency
//!
//! redb allows a single write transaction at a time; command processing
//! funnels every state change through one such transaction, which is
//! what makes stock deduction and event appends all-or-nothing.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use thiserror::Error;

use shared::models::{DiningTable, Ingredient, MenuItem, Recipe, Tenant};
use shared::order::{OrderEvent, OrderSnapshot};
use shared::stock::StockMovement;
use shared::util;

const ORDER_EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("order_events");

const ORDER_SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("order_snapshots");

const ACTIVE_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("active_orders");

const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, i64> =
    TableDefinition::new("processed_commands");

const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const STOCK_MOVEMENTS_TABLE: TableDefinition<(i64, u64), &[u8]> =
    TableDefinition::new("stock_movements");

const TENANTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("tenants");
const MENU_ITEMS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("menu_items");
const INGREDIENTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("ingredients");
const RECIPES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("recipes");
const DINING_TABLES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("dining_tables");

const EVENT_SEQUENCE_KEY: &str = "event_seq";
const MOVEMENT_SEQUENCE_KEY: &str = "movement_seq";
const ORDER_COUNT_KEY: &str = "order_count";
const ORDER_DATE_KEY: &str = "order_date";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// All persistent state, backed by a single redb database.
#[derive(Clone)]
pub struct PosStorage {
    db: Arc<Database>,
}

impl PosStorage {
    /// Open or create the database at the given path.
    ///
    /// redb commits with immediate durability by default, so a commit
    /// that returned is safe against power loss. Counters are only
    /// initialized on first open.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(ORDER_EVENTS_TABLE)?;
            let _ = txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
            let _ = txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let _ = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = txn.open_table(STOCK_MOVEMENTS_TABLE)?;
            let _ = txn.open_table(TENANTS_TABLE)?;
            let _ = txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = txn.open_table(INGREDIENTS_TABLE)?;
            let _ = txn.open_table(RECIPES_TABLE)?;
            let _ = txn.open_table(DINING_TABLES_TABLE)?;

            let mut counters = txn.open_table(COUNTERS_TABLE)?;
            if counters.get(EVENT_SEQUENCE_KEY)?.is_none() {
                counters.insert(EVENT_SEQUENCE_KEY, 0u64)?;
            }
            if counters.get(MOVEMENT_SEQUENCE_KEY)?.is_none() {
                counters.insert(MOVEMENT_SEQUENCE_KEY, 0u64)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction. Only one can be open at a time.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Event Sequence ==========

    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(EVENT_SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(EVENT_SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Persist the sequence high-water mark after events are generated.
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        table.insert(EVENT_SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Order Counter ==========

    /// Increment and return the daily order counter, resetting it when
    /// the business date (in the tenant's timezone) has rolled over.
    ///
    /// Runs in its own write transaction: order numbers are generated
    /// before the command transaction opens, so a later abort can leave
    /// a gap in the numbering but never a duplicate.
    pub fn next_order_count(&self, tz: chrono_tz::Tz) -> StorageResult<u64> {
        let today: u64 = util::business_date(tz).parse().unwrap_or(0);

        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            let stored_date = table.get(ORDER_DATE_KEY)?.map(|g| g.value()).unwrap_or(0);

            let next = if stored_date != today {
                table.insert(ORDER_DATE_KEY, today)?;
                1
            } else {
                table.get(ORDER_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0) + 1
            };
            table.insert(ORDER_COUNT_KEY, next)?;
            next
        };
        txn.commit()?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, util::now_millis())?;
        Ok(())
    }

    // ========== Event Operations ==========

    pub fn store_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_EVENTS_TABLE)?;

        let mut events = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(ORDER_SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Active Orders ==========

    pub fn mark_order_active(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    pub fn mark_order_inactive(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    pub fn get_active_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;

        let mut order_ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            order_ids.push(key.value().to_string());
        }
        Ok(order_ids)
    }

    /// All active snapshots belonging to one tenant.
    pub fn get_active_orders(&self, tenant_id: i64) -> StorageResult<Vec<OrderSnapshot>> {
        let mut snapshots = Vec::new();
        for order_id in self.get_active_order_ids()? {
            if let Some(snapshot) = self.get_snapshot(&order_id)?
                && snapshot.tenant_id == tenant_id
            {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    /// Find the active order occupying a table, if any (within txn).
    pub fn find_active_order_for_table_txn(
        &self,
        txn: &WriteTransaction,
        tenant_id: i64,
        table_id: i64,
    ) -> StorageResult<Option<String>> {
        let active_table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let snapshots_table = txn.open_table(ORDER_SNAPSHOTS_TABLE)?;

        for result in active_table.iter()? {
            let (key, _) = result?;
            let order_id = key.value();

            if let Some(value) = snapshots_table.get(order_id)? {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                if snapshot.tenant_id == tenant_id && snapshot.table_id == Some(table_id) {
                    return Ok(Some(order_id.to_string()));
                }
            }
        }
        Ok(None)
    }

    /// Read-only variant for the pre-transaction occupancy check.
    pub fn find_active_order_for_table(
        &self,
        tenant_id: i64,
        table_id: i64,
    ) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let active_table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let snapshots_table = read_txn.open_table(ORDER_SNAPSHOTS_TABLE)?;

        for result in active_table.iter()? {
            let (key, _) = result?;
            let order_id = key.value();

            if let Some(value) = snapshots_table.get(order_id)? {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                if snapshot.tenant_id == tenant_id && snapshot.table_id == Some(table_id) {
                    return Ok(Some(order_id.to_string()));
                }
            }
        }
        Ok(None)
    }

    // ========== Stock Movements ==========

    /// Allocate the next movement id (within transaction).
    pub fn next_movement_id_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(MOVEMENT_SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(MOVEMENT_SEQUENCE_KEY, next)?;
        Ok(next)
    }

    pub fn store_movement(
        &self,
        txn: &WriteTransaction,
        movement: &StockMovement,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(STOCK_MOVEMENTS_TABLE)?;
        let key = (movement.tenant_id, movement.id);
        let value = serde_json::to_vec(movement)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All movements for one tenant, in ledger order.
    pub fn get_movements(&self, tenant_id: i64) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        let range_start = (tenant_id, 0u64);
        let range_end = (tenant_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let movement: StockMovement = serde_json::from_slice(value.value())?;
            movements.push(movement);
        }

        movements.sort_by_key(|m| m.id);
        Ok(movements)
    }

    // ========== Catalog: Tenants ==========

    pub fn store_tenant(&self, tenant: &Tenant) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TENANTS_TABLE)?;
            let value = serde_json::to_vec(tenant)?;
            table.insert(tenant.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_tenant(&self, tenant_id: i64) -> StorageResult<Option<Tenant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TENANTS_TABLE)?;
        match table.get(tenant_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_all_tenants(&self) -> StorageResult<Vec<Tenant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TENANTS_TABLE)?;

        let mut tenants = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            tenants.push(serde_json::from_slice(value.value())?);
        }
        Ok(tenants)
    }

    // ========== Catalog: Menu Items ==========

    pub fn store_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
            let value = serde_json::to_vec(item)?;
            table.insert(item.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_menu_item(&self, item_id: i64) -> StorageResult<Option<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
        match table.get(item_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_menu_items(&self, tenant_id: i64) -> StorageResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;

        let mut items = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let item: MenuItem = serde_json::from_slice(value.value())?;
            if item.tenant_id == tenant_id {
                items.push(item);
            }
        }
        Ok(items)
    }

    // ========== Catalog: Ingredients ==========

    pub fn store_ingredient(&self, ingredient: &Ingredient) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(INGREDIENTS_TABLE)?;
            let value = serde_json::to_vec(ingredient)?;
            table.insert(ingredient.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_ingredient(&self, ingredient_id: i64) -> StorageResult<Option<Ingredient>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INGREDIENTS_TABLE)?;
        match table.get(ingredient_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_ingredient_txn(
        &self,
        txn: &WriteTransaction,
        ingredient_id: i64,
    ) -> StorageResult<Option<Ingredient>> {
        let table = txn.open_table(INGREDIENTS_TABLE)?;
        match table.get(ingredient_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Update an ingredient inside an open transaction, used when the
    /// stock ledger and the cached level must move together.
    pub fn store_ingredient_txn(
        &self,
        txn: &WriteTransaction,
        ingredient: &Ingredient,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(INGREDIENTS_TABLE)?;
        let value = serde_json::to_vec(ingredient)?;
        table.insert(ingredient.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_ingredients(&self, tenant_id: i64) -> StorageResult<Vec<Ingredient>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INGREDIENTS_TABLE)?;

        let mut ingredients = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let ingredient: Ingredient = serde_json::from_slice(value.value())?;
            if ingredient.tenant_id == tenant_id {
                ingredients.push(ingredient);
            }
        }
        Ok(ingredients)
    }

    // ========== Catalog: Recipes ==========

    /// Replace the full recipe of one menu item.
    pub fn store_recipes(&self, menu_item_id: i64, recipes: &[Recipe]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECIPES_TABLE)?;
            let value = serde_json::to_vec(recipes)?;
            table.insert(menu_item_id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_recipes(&self, menu_item_id: i64) -> StorageResult<Vec<Recipe>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECIPES_TABLE)?;
        match table.get(menu_item_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(Vec::new()),
        }
    }

    // ========== Catalog: Dining Tables ==========

    pub fn store_dining_table(&self, dining_table: &DiningTable) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DINING_TABLES_TABLE)?;
            let value = serde_json::to_vec(dining_table)?;
            table.insert(dining_table.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_dining_table(&self, table_id: i64) -> StorageResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DINING_TABLES_TABLE)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_dining_tables(&self, tenant_id: i64) -> StorageResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DINING_TABLES_TABLE)?;

        let mut tables = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let dining_table: DiningTable = serde_json::from_slice(value.value())?;
            if dining_table.tenant_id == tenant_id {
                tables.push(dining_table);
            }
        }
        Ok(tables)
    }
}
