//! OrderCompleted event applier

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

use crate::orders::traits::EventApplier;

pub struct OrderCompletedApplier;

impl EventApplier for OrderCompletedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCompleted { final_total } = &event.payload {
            snapshot.status = OrderStatus::Completed;
            snapshot.completed_at = Some(event.timestamp);
            // The total was frozen when the completion was accepted
            snapshot.total = *final_total;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
