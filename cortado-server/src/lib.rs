//! Cortado server: a multi-tenant cafe POS order core.
//!
//! Orders are event-sourced: commands validate against snapshots and
//! append events; snapshots are a cache rebuildable from the stream.
//! Stock lives in an append-only movement ledger whose deductions
//! commit in the same transaction as the triggering order event.

pub mod api;
pub mod catalog;
pub mod core;
pub mod orders;
pub mod routes;
pub mod stock;
pub mod storage;
pub mod utils;

pub use crate::core::{Config, ServerState};
