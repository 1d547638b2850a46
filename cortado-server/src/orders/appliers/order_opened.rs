//! OrderOpened event applier
//!
//! Seeds a fresh snapshot with the order's identity. The snapshot
//! itself is created by the manager; this applier fills it in.

use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

use crate::orders::traits::EventApplier;

pub struct OrderOpenedApplier;

impl EventApplier for OrderOpenedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderOpened {
            order_number,
            order_type,
            table_id,
            table_name,
            guest_count,
        } = &event.payload
        {
            snapshot.order_number = order_number.clone();
            snapshot.order_type = *order_type;
            snapshot.table_id = *table_id;
            snapshot.table_name = table_name.clone();
            snapshot.guest_count = *guest_count;
            snapshot.created_at = event.timestamp;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderStatus, OrderType};

    #[test]
    fn test_order_opened_fills_identity() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string(), 1);
        let event = OrderEvent::new(
            1,
            "order-1".to_string(),
            1,
            "op-1".to_string(),
            "Ana".to_string(),
            "cmd-1".to_string(),
            None,
            EventPayload::OrderOpened {
                order_number: "ORD20260824-10001".to_string(),
                order_type: OrderType::DineIn,
                table_id: Some(42),
                table_name: Some("T1".to_string()),
                guest_count: Some(3),
            },
        );

        OrderOpenedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.order_number, "ORD20260824-10001");
        assert_eq!(snapshot.table_id, Some(42));
        assert_eq!(snapshot.guest_count, Some(3));
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.last_sequence, 1);
        assert!(snapshot.verify_checksum());
    }
}
