//! PreparationStarted event applier
//!
//! The deductions carried by the event were already written to the
//! stock ledger in the same transaction; the snapshot only records
//! that the one-shot deduction happened.

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

use crate::orders::traits::EventApplier;

pub struct PreparationStartedApplier;

impl EventApplier for PreparationStartedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PreparationStarted { .. } = &event.payload {
            snapshot.status = OrderStatus::Preparing;
            snapshot.preparing_at = Some(event.timestamp);
            snapshot.stock_deducted = true;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::StockDeduction;

    #[test]
    fn test_preparation_started_sets_flag() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string(), 1);
        snapshot.status = OrderStatus::Confirmed;

        let event = OrderEvent::new(
            3,
            "order-1".to_string(),
            1,
            "op-1".to_string(),
            "Ana".to_string(),
            "cmd-1".to_string(),
            None,
            EventPayload::PreparationStarted {
                deductions: vec![StockDeduction {
                    ingredient_id: 5,
                    quantity: 18.0,
                }],
            },
        );

        PreparationStartedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.status, OrderStatus::Preparing);
        assert!(snapshot.stock_deducted);
        assert_eq!(snapshot.preparing_at, Some(event.timestamp));
        assert!(snapshot.verify_checksum());
    }
}
