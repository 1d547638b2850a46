//! OrdersManager - Core command processing and event generation
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Tenant check + OpenOrder pre-checks (table occupancy)
//!     ├─ 3. Pre-generate order number (own transaction)
//!     ├─ 4. Begin write transaction, re-check idempotency + occupancy
//!     ├─ 5. Build action (inject menu items / deduction plan) and execute
//!     ├─ 6. Apply events to snapshots via EventApplier
//!     ├─ 7. Apply stock deductions in the same transaction
//!     ├─ 8. Persist events, snapshots, sequence, processed-command mark
//!     ├─ 9. Commit transaction
//!     ├─ 10. Broadcast event(s)
//!     └─ 11. Return response
//! ```

mod error;
pub use error::*;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;

use shared::models::Tenant;
use shared::order::{
    CommandResponse, EventPayload, OrderCommand, OrderCommandPayload, OrderEvent, OrderSnapshot,
    OrderType,
};

use crate::catalog::{CatalogError, CatalogService};
use crate::orders::actions::{
    AddItemsAction, CommandAction, OpenOrderAction, StartPreparingAction,
};
use crate::orders::appliers::EventAction;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError,
};
use crate::stock::{RecipeResolver, StockLedger};
use crate::storage::{PosStorage, StorageError};

/// Event broadcast channel capacity.
const EVENT_CHANNEL_CAPACITY: usize = 65536;

/// Command processor over the event-sourced order store.
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Clients use it to detect server restarts and trigger full resync.
pub struct OrdersManager {
    storage: PosStorage,
    catalog: Arc<CatalogService>,
    resolver: RecipeResolver,
    ledger: Arc<StockLedger>,
    event_tx: broadcast::Sender<OrderEvent>,
    epoch: String,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<PosStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(
        storage: PosStorage,
        catalog: Arc<CatalogService>,
        ledger: Arc<StockLedger>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = shared::util::uuid_v4();
        tracing::info!(epoch = %epoch, "OrdersManager started with new epoch");
        Self {
            storage,
            resolver: RecipeResolver::new(catalog.clone()),
            catalog,
            ledger,
            event_tx,
            epoch,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &PosStorage {
        &self.storage
    }

    /// Generate the next order number (crash-safe via redb).
    ///
    /// The daily counter lives in its own transaction, so an aborted
    /// command can leave a gap in the numbering but never a duplicate.
    fn next_order_number(&self, tenant: &Tenant) -> String {
        let tz = tenant.tz();
        let count = self.storage.next_order_count(tz).unwrap_or(1);
        let date_str = shared::util::business_date(tz);
        format!("ORD{}-{}", date_str, 10000 + count)
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        match self.process_command(cmd.clone()) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in events {
                    if self.event_tx.send(event).is_err() {
                        tracing::debug!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                response
            }
            Err(err) => {
                tracing::warn!(command_id = %cmd.command_id, error = %err, "Command rejected");
                CommandResponse::error(cmd.command_id, err.code(), err.to_string())
            }
        }
    }

    /// Process command and return response with events
    fn process_command(
        &self,
        cmd: OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, tenant_id = cmd.tenant_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            let order_id = cmd.order_id().map(String::from);
            return Ok((CommandResponse::duplicate(cmd.command_id, order_id), vec![]));
        }

        // 2. The tenant must exist and be active
        let tenant = match self.catalog.tenant(cmd.tenant_id) {
            Ok(tenant) => tenant,
            Err(CatalogError::NotFound(_)) => {
                return Err(ManagerError::TenantNotFound(cmd.tenant_id));
            }
            Err(err) => return Err(err.into()),
        };
        if !tenant.is_active {
            return Err(ManagerError::TenantInactive(cmd.tenant_id));
        }

        // 3. OpenOrder pre-checks before spending an order number:
        // dine-in needs an existing, active, unoccupied table
        let mut dine_in_table = None;
        if let OrderCommandPayload::OpenOrder {
            order_type: OrderType::DineIn,
            table_id: Some(table_id),
            ..
        } = &cmd.payload
        {
            let table = self.catalog.dining_table(cmd.tenant_id, *table_id)?;
            if !table.is_active {
                return Err(ManagerError::Order(OrderError::InvalidOperation(format!(
                    "table {} is not active",
                    table.name
                ))));
            }
            if let Some(existing) = self
                .storage
                .find_active_order_for_table(cmd.tenant_id, *table_id)?
            {
                return Err(ManagerError::TableOccupied(format!(
                    "table {} is already occupied (order: {})",
                    table.name, existing
                )));
            }
            dine_in_table = Some((*table_id, table.name));
        }
        let resolved_table_name = dine_in_table.as_ref().map(|(_, name)| name.clone());

        // 4. Pre-generate the order number for OpenOrder (BEFORE the
        // command transaction, redb doesn't allow nested writes)
        let pre_generated_number = match &cmd.payload {
            OrderCommandPayload::OpenOrder { .. } => {
                let number = self.next_order_number(&tenant);
                tracing::debug!(order_number = %number, "Pre-generated order number");
                Some(number)
            }
            _ => None,
        };

        // 5. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if self
            .storage
            .is_command_processed_txn(&txn, &cmd.command_id)?
        {
            let order_id = cmd.order_id().map(String::from);
            return Ok((CommandResponse::duplicate(cmd.command_id, order_id), vec![]));
        }

        // Re-check table occupancy within the transaction: a concurrent
        // OpenOrder may have claimed the table between the pre-check and
        // begin_write
        if let Some((table_id, table_name)) = &dine_in_table
            && let Some(existing) = self
                .storage
                .find_active_order_for_table_txn(&txn, cmd.tenant_id, *table_id)?
        {
            return Err(ManagerError::TableOccupied(format!(
                "table {table_name} is already occupied (order: {existing})"
            )));
        }

        // 6. Create context and metadata
        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            tenant_id: cmd.tenant_id,
            operator_id: cmd.operator_id.clone(),
            operator_name: cmd.operator_name.clone(),
            timestamp: cmd.timestamp,
        };

        // 7. Build the action, injecting catalog data where needed
        let action = self.build_action(&cmd, pre_generated_number, resolved_table_name)?;
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))
            .map_err(ManagerError::from)?;

        // 8. Apply events to snapshots; stock deductions ride in the
        // same transaction so they share the command's fate
        for event in &events {
            let mut snapshot = match ctx.load_snapshot(&event.order_id) {
                Ok(snapshot) => snapshot,
                // A brand-new order has no snapshot yet
                Err(OrderError::OrderNotFound(_)) => {
                    OrderSnapshot::new(event.order_id.clone(), event.tenant_id)
                }
                Err(err) => return Err(err.into()),
            };

            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);

            if let EventPayload::PreparationStarted { deductions } = &event.payload {
                self.ledger.apply_deductions_txn(
                    &txn,
                    event.tenant_id,
                    &snapshot.order_number,
                    deductions,
                    &event.operator_id,
                    &event.operator_name,
                )?;
            }

            ctx.save_snapshot(snapshot);
        }

        // 9. Persist events
        for event in &events {
            self.storage.store_event(&txn, event)?;
        }

        // 10. Persist snapshots and update active order tracking
        for snapshot in ctx.modified_snapshots() {
            self.storage.store_snapshot(&txn, snapshot)?;
            if snapshot.is_terminal() {
                self.storage.mark_order_inactive(&txn, &snapshot.order_id)?;
            } else {
                self.storage.mark_order_active(&txn, &snapshot.order_id)?;
            }
        }

        // 11. Update sequence counter
        let max_sequence = events
            .iter()
            .map(|e| e.sequence)
            .max()
            .unwrap_or(current_sequence);
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }

        // 12. Mark command processed
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // 13. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        let order_id = events.first().map(|e| e.order_id.clone());
        tracing::info!(command_id = %cmd.command_id, order_id = ?order_id, event_count = events.len(), "Command processed successfully");
        Ok((CommandResponse::success(cmd.command_id, order_id), events))
    }

    /// Build the concrete action for a command.
    ///
    /// OpenOrder and AddItems get the referenced menu items resolved
    /// here so the action can freeze prices; StartPreparing gets the
    /// deduction plan resolved from the order's current lines.
    fn build_action(
        &self,
        cmd: &OrderCommand,
        pre_generated_number: Option<String>,
        resolved_table_name: Option<String>,
    ) -> ManagerResult<CommandAction> {
        let action = match &cmd.payload {
            OrderCommandPayload::OpenOrder {
                order_type,
                table_id,
                guest_count,
                items,
            } => {
                let menu = self.resolve_menu(cmd.tenant_id, items)?;
                let order_number = pre_generated_number.ok_or_else(|| {
                    ManagerError::Order(OrderError::InvalidOperation(
                        "order number must be pre-generated for OpenOrder".to_string(),
                    ))
                })?;
                CommandAction::OpenOrder(OpenOrderAction {
                    order_type: *order_type,
                    table_id: *table_id,
                    table_name: resolved_table_name,
                    guest_count: *guest_count,
                    items: items.clone(),
                    menu,
                    order_number,
                })
            }
            OrderCommandPayload::AddItems { order_id, items } => {
                let menu = self.resolve_menu(cmd.tenant_id, items)?;
                CommandAction::AddItems(AddItemsAction {
                    order_id: order_id.clone(),
                    items: items.clone(),
                    menu,
                })
            }
            OrderCommandPayload::StartPreparing { order_id } => {
                // Resolve the plan from the persisted snapshot; if the
                // order is missing the action reports OrderNotFound
                let deductions = match self.storage.get_snapshot(order_id)? {
                    Some(snapshot) => self.resolver.deduction_plan(&snapshot.items)?,
                    None => Vec::new(),
                };
                CommandAction::StartPreparing(StartPreparingAction {
                    order_id: order_id.clone(),
                    deductions,
                })
            }
            _ => cmd.into(),
        };
        Ok(action)
    }

    fn resolve_menu(
        &self,
        tenant_id: i64,
        items: &[shared::order::OrderItemInput],
    ) -> ManagerResult<HashMap<i64, shared::models::MenuItem>> {
        Ok(self
            .catalog
            .menu_items_for(tenant_id, items.iter().map(|i| i.menu_item_id))?)
    }

    // ========== Public Query Methods ==========

    /// Get a snapshot by order ID, scoped to the calling tenant.
    pub fn get_order(&self, tenant_id: i64, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let snapshot = self
            .storage
            .get_snapshot(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        if snapshot.tenant_id != tenant_id {
            return Err(OrderError::TenantMismatch {
                expected: tenant_id,
                actual: snapshot.tenant_id,
            }
            .into());
        }
        Ok(snapshot)
    }

    /// All active order snapshots of one tenant.
    pub fn get_active_orders(&self, tenant_id: i64) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.get_active_orders(tenant_id)?)
    }

    /// Get current sequence number
    pub fn get_current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.storage.get_current_sequence()?)
    }

    /// Full event stream of one order, scoped to the calling tenant.
    pub fn get_events_for_order(
        &self,
        tenant_id: i64,
        order_id: &str,
    ) -> ManagerResult<Vec<OrderEvent>> {
        self.get_order(tenant_id, order_id)?;
        Ok(self.storage.get_events_for_order(order_id)?)
    }

    /// Rebuild a snapshot from its event stream (for verification).
    ///
    /// A rebuilt snapshot whose checksum differs from the stored one
    /// means the snapshot cache has drifted from the source of truth.
    pub fn rebuild_snapshot(
        &self,
        tenant_id: i64,
        order_id: &str,
    ) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_events_for_order(order_id)?;
        let first = events
            .first()
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
            .map_err(ManagerError::from)?;
        if first.tenant_id != tenant_id {
            return Err(OrderError::TenantMismatch {
                expected: tenant_id,
                actual: first.tenant_id,
            }
            .into());
        }

        let mut snapshot = OrderSnapshot::new(order_id.to_string(), first.tenant_id);
        for event in &events {
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
        }
        Ok(snapshot)
    }
}

// Make OrdersManager Clone-able via Arc
impl Clone for OrdersManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            catalog: self.catalog.clone(),
            resolver: self.resolver.clone(),
            ledger: self.ledger.clone(),
            event_tx: self.event_tx.clone(),
            epoch: self.epoch.clone(),
        }
    }
}
