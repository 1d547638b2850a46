//! OrderCancelled event applier

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

use crate::orders::traits::EventApplier;

pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled { reason } = &event.payload {
            snapshot.status = OrderStatus::Cancelled;
            snapshot.cancelled_at = Some(event.timestamp);
            snapshot.cancel_reason = Some(reason.clone());

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
