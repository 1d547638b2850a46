//! Shared domain types for the Cortado order core.
//!
//! Everything that crosses a process or wire boundary lives here: catalog
//! models, order commands/events/snapshots, and stock movement records.

pub mod models;
pub mod order;
pub mod stock;
pub mod util;
