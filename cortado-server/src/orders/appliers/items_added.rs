//! ItemsAdded event applier
//!
//! Appends frozen lines and recomputes the money totals.

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, PaymentStatus};

use crate::orders::money;
use crate::orders::traits::EventApplier;

pub struct ItemsAddedApplier;

impl EventApplier for ItemsAddedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ItemsAdded { items } = &event.payload {
            snapshot.items.extend(items.iter().cloned());
            money::recalculate_totals(snapshot);

            // A grown total can demote Paid back to Partial
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
