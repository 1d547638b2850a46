//! ChargesSet event applier

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, PaymentStatus};

use crate::orders::money;
use crate::orders::traits::EventApplier;

pub struct ChargesSetApplier;

impl EventApplier for ChargesSetApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ChargesSet {
            service_charge,
            discount,
        } = &event.payload
        {
            snapshot.service_charge = *service_charge;
            snapshot.discount = *discount;
            money::recalculate_totals(snapshot);

            if snapshot.payment_status != PaymentStatus::Refunded {
                snapshot.payment_status =
                    money::derive_payment_status(snapshot.paid_amount, snapshot.total);
            }

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
