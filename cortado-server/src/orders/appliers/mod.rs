//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles one
//! specific event type. Appliers are PURE functions: replaying the
//! same events always yields the same snapshot.

use enum_dispatch::enum_dispatch;

use shared::order::{EventPayload, OrderEvent};

use crate::orders::traits::EventApplier;

mod charges_set;
mod items_added;
mod order_cancelled;
mod order_completed;
mod order_confirmed;
mod order_opened;
mod order_ready;
mod order_refunded;
mod order_served;
mod payment_added;
mod preparation_started;

pub use charges_set::ChargesSetApplier;
pub use items_added::ItemsAddedApplier;
pub use order_cancelled::OrderCancelledApplier;
pub use order_completed::OrderCompletedApplier;
pub use order_confirmed::OrderConfirmedApplier;
pub use order_opened::OrderOpenedApplier;
pub use order_ready::OrderReadyApplier;
pub use order_refunded::OrderRefundedApplier;
pub use order_served::OrderServedApplier;
pub use payment_added::PaymentAddedApplier;
pub use preparation_started::PreparationStartedApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderOpened(OrderOpenedApplier),
    ItemsAdded(ItemsAddedApplier),
    OrderConfirmed(OrderConfirmedApplier),
    PreparationStarted(PreparationStartedApplier),
    OrderReady(OrderReadyApplier),
    OrderServed(OrderServedApplier),
    OrderCompleted(OrderCompletedApplier),
    OrderCancelled(OrderCancelledApplier),
    PaymentAdded(PaymentAddedApplier),
    OrderRefunded(OrderRefundedApplier),
    ChargesSet(ChargesSetApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the only place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderOpened { .. } => EventAction::OrderOpened(OrderOpenedApplier),
            EventPayload::ItemsAdded { .. } => EventAction::ItemsAdded(ItemsAddedApplier),
            EventPayload::OrderConfirmed {} => EventAction::OrderConfirmed(OrderConfirmedApplier),
            EventPayload::PreparationStarted { .. } => {
                EventAction::PreparationStarted(PreparationStartedApplier)
            }
            EventPayload::OrderReady {} => EventAction::OrderReady(OrderReadyApplier),
            EventPayload::OrderServed {} => EventAction::OrderServed(OrderServedApplier),
            EventPayload::OrderCompleted { .. } => {
                EventAction::OrderCompleted(OrderCompletedApplier)
            }
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::PaymentAdded { .. } => EventAction::PaymentAdded(PaymentAddedApplier),
            EventPayload::OrderRefunded { .. } => EventAction::OrderRefunded(OrderRefundedApplier),
            EventPayload::ChargesSet { .. } => EventAction::ChargesSet(ChargesSetApplier),
        }
    }
}
