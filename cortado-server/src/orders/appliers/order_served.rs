//! OrderServed event applier

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

use crate::orders::traits::EventApplier;

pub struct OrderServedApplier;

impl EventApplier for OrderServedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderServed {} = &event.payload {
            snapshot.status = OrderStatus::Served;
            snapshot.served_at = Some(event.timestamp);

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
