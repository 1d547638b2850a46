//! Shared fixtures for order unit tests.

pub(crate) mod support {
    use std::collections::HashMap;

    use redb::WriteTransaction;

    use shared::models::{MenuItem, MenuModifier, MenuVariant};
    use shared::order::{
        ModifierSnapshot, OrderItemSnapshot, OrderSnapshot, OrderStatus, PaymentMethod,
        PaymentRecord, PaymentStatus,
    };
    use shared::util;

    use crate::orders::money;
    use crate::orders::traits::CommandMetadata;
    use crate::storage::PosStorage;

    pub(crate) fn test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: util::uuid_v4(),
            tenant_id: 1,
            operator_id: "op-1".to_string(),
            operator_name: "Test Operator".to_string(),
            timestamp: 1_234_567_890,
        }
    }

    /// Menu with one latte (id 10): base 3.50, 10% tax, Large variant
    /// (id 11, 4.20) and an oat milk modifier (id 21, 0.50).
    pub(crate) fn latte_menu() -> HashMap<i64, MenuItem> {
        let latte = MenuItem {
            id: 10,
            tenant_id: 1,
            name: "Latte".to_string(),
            base_price: 3.50,
            tax_rate: 10.0,
            variants: vec![MenuVariant {
                id: 11,
                name: "Large".to_string(),
                price: 4.20,
                is_active: true,
            }],
            modifiers: vec![MenuModifier {
                id: 21,
                name: "Oat milk".to_string(),
                price: 0.50,
                is_active: true,
            }],
            is_active: true,
            is_available: true,
            created_at: 0,
            updated_at: 0,
        };
        HashMap::from([(latte.id, latte)])
    }

    fn latte_line(quantity: i32) -> OrderItemSnapshot {
        OrderItemSnapshot {
            line_id: util::uuid_v4(),
            menu_item_id: 10,
            name: "Latte".to_string(),
            variant_id: None,
            variant_name: None,
            modifiers: Vec::<ModifierSnapshot>::new(),
            quantity,
            unit_price: 3.50,
            tax_rate: 10.0,
            line_subtotal: 3.50 * quantity as f64,
            note: None,
        }
    }

    /// An order with two lattes and recalculated totals.
    pub(crate) fn order_with_items(
        order_id: &str,
        tenant_id: i64,
        status: OrderStatus,
    ) -> OrderSnapshot {
        let mut snapshot = OrderSnapshot::new(order_id.to_string(), tenant_id);
        snapshot.status = status;
        snapshot.items = vec![latte_line(2)];
        money::recalculate_totals(&mut snapshot);
        snapshot.update_checksum();
        snapshot
    }

    /// Like `order_with_items` but fully paid by card.
    pub(crate) fn paid_order(
        order_id: &str,
        tenant_id: i64,
        status: OrderStatus,
    ) -> OrderSnapshot {
        let mut snapshot = order_with_items(order_id, tenant_id, status);
        snapshot.payments.push(PaymentRecord {
            payment_id: util::uuid_v4(),
            method: PaymentMethod::Card,
            amount: snapshot.total,
            tendered: None,
            change: None,
            reference: None,
            operator_id: "op-1".to_string(),
            timestamp: 0,
        });
        snapshot.paid_amount = snapshot.total;
        snapshot.payment_status = PaymentStatus::Paid;
        snapshot.update_checksum();
        snapshot
    }

    pub(crate) fn store_order(
        storage: &PosStorage,
        txn: &WriteTransaction,
        order_id: &str,
        tenant_id: i64,
        status: OrderStatus,
    ) {
        let mut snapshot = OrderSnapshot::new(order_id.to_string(), tenant_id);
        snapshot.status = status;
        snapshot.update_checksum();
        storage.store_snapshot(txn, &snapshot).unwrap();
    }

    pub(crate) fn store_order_with_items(
        storage: &PosStorage,
        txn: &WriteTransaction,
        order_id: &str,
        tenant_id: i64,
        status: OrderStatus,
    ) {
        let snapshot = order_with_items(order_id, tenant_id, status);
        storage.store_snapshot(txn, &snapshot).unwrap();
    }

    pub(crate) fn store_paid_order(
        storage: &PosStorage,
        txn: &WriteTransaction,
        order_id: &str,
        tenant_id: i64,
        status: OrderStatus,
    ) {
        let snapshot = paid_order(order_id, tenant_id, status);
        storage.store_snapshot(txn, &snapshot).unwrap();
    }
}
