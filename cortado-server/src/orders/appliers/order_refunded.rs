//! OrderRefunded event applier
//!
//! Payment records stay untouched as the audit trail; only the
//! order-level payment status flips.

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, PaymentStatus};

use crate::orders::traits::EventApplier;

pub struct OrderRefundedApplier;

impl EventApplier for OrderRefundedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderRefunded { reason } = &event.payload {
            snapshot.payment_status = PaymentStatus::Refunded;
            snapshot.refund_reason = Some(reason.clone());

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
