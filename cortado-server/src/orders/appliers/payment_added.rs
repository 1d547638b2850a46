//! PaymentAdded event applier
//!
//! Records the payment and re-derives the payment status.

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, PaymentRecord, PaymentStatus};

use crate::orders::money::{self, to_decimal, to_f64};
use crate::orders::traits::EventApplier;

pub struct PaymentAddedApplier;

impl EventApplier for PaymentAddedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentAdded {
            payment_id,
            method,
            amount,
            tendered,
            change,
            reference,
        } = &event.payload
        {
            snapshot.payments.push(PaymentRecord {
                payment_id: payment_id.clone(),
                method: *method,
                amount: *amount,
                tendered: *tendered,
                change: *change,
                reference: reference.clone(),
                operator_id: event.operator_id.clone(),
                timestamp: event.timestamp,
            });

            // Decimal addition avoids float drift across many payments
            snapshot.paid_amount =
                to_f64(to_decimal(snapshot.paid_amount) + to_decimal(*amount));

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
