//! Order domain: commands in, events out, snapshots as the fold.

mod command;
mod event;
mod snapshot;
mod types;

pub use command::{OrderCommand, OrderCommandPayload};
pub use event::{EventPayload, OrderEvent, StockDeduction};
pub use snapshot::{ModifierSnapshot, OrderItemSnapshot, OrderSnapshot, PaymentRecord};
pub use types::{
    CommandError, CommandErrorCode, CommandResponse, OrderItemInput, OrderStatus, OrderTransition,
    OrderType, PaymentInput, PaymentMethod, PaymentStatus,
};
