//! Stock movement ledger types.

mod movement;

pub use movement::{AdjustmentDirection, MovementInput, MovementKind, StockMovement};
