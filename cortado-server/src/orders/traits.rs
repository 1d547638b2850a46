//! Core traits and context for command processing.
//!
//! `CommandHandler` validates and emits events; `EventApplier` folds an
//! event into a snapshot. Appliers must stay pure so replay always
//! reproduces the same snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use thiserror::Error;

use shared::order::{OrderEvent, OrderSnapshot};

use crate::storage::{PosStorage, StorageError};

/// Domain errors raised while validating or executing a command.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Invalid transition: cannot {attempted} from {current}")]
    InvalidTransition { current: String, attempted: String },

    #[error("Tenant mismatch: order belongs to tenant {actual}, not {expected}")]
    TenantMismatch { expected: i64, actual: i64 },

    #[error("Insufficient stock for {ingredient}: requested {requested}, available {available}")]
    InsufficientStock {
        ingredient: String,
        requested: f64,
        available: f64,
    },

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Table occupied: {0}")]
    TableOccupied(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        OrderError::Storage(err.to_string())
    }
}

/// Attribution carried from the command into every emitted event.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub tenant_id: i64,
    pub operator_id: String,
    pub operator_name: String,
    /// Client timestamp from the command.
    pub timestamp: i64,
}

/// Mutable state shared by all actions executing within one write
/// transaction: the sequence allocator and a snapshot working set.
///
/// Snapshots loaded here are cached, so an action always sees the
/// writes of earlier events in the same command, and the manager
/// persists exactly the snapshots that were touched.
pub struct CommandContext<'a> {
    pub txn: &'a WriteTransaction,
    pub storage: &'a PosStorage,
    sequence: u64,
    snapshots: HashMap<String, OrderSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a PosStorage,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
            snapshots: HashMap::new(),
        }
    }

    /// Allocate the next event sequence number.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Load a snapshot, preferring the in-context working copy.
    pub fn load_snapshot(&mut self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        let snapshot = self
            .storage
            .get_snapshot_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        self.snapshots.insert(order_id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    /// Put a snapshot into the working set (also used to seed brand-new
    /// orders that are not in storage yet).
    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    /// Snapshots touched during this command, to be persisted on commit.
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.snapshots.values()
    }
}

/// Reject commands that reach across tenants.
pub fn ensure_tenant(snapshot: &OrderSnapshot, tenant_id: i64) -> Result<(), OrderError> {
    if snapshot.tenant_id != tenant_id {
        return Err(OrderError::TenantMismatch {
            expected: tenant_id,
            actual: snapshot.tenant_id,
        });
    }
    Ok(())
}

/// A command action: validates against current snapshots and returns
/// the events to append. Actions never mutate storage directly.
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

// enum_dispatch expands the dispatch impl at the trait site, so the
// enum and every variant type must be nameable from this module.
use crate::orders::appliers::{
    ChargesSetApplier, EventAction, ItemsAddedApplier, OrderCancelledApplier,
    OrderCompletedApplier, OrderConfirmedApplier, OrderOpenedApplier, OrderReadyApplier,
    OrderRefundedApplier, OrderServedApplier, PaymentAddedApplier, PreparationStartedApplier,
};

/// Folds one event into a snapshot. Must be pure: no I/O, no clock.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}
