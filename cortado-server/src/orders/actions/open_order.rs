//! OpenOrder command handler
//!
//! Creates a new order in Pending state, optionally with an initial
//! set of items. The order number and menu items are injected by
//! OrdersManager before execution.

use std::collections::HashMap;

use async_trait::async_trait;

use shared::models::MenuItem;
use shared::order::{EventPayload, OrderEvent, OrderItemInput, OrderType};
use shared::util;

use crate::orders::money;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// OpenOrder action
#[derive(Debug, Clone)]
pub struct OpenOrderAction {
    pub order_type: OrderType,
    pub table_id: Option<i64>,
    /// Resolved from the catalog by OrdersManager for dine-in orders.
    pub table_name: Option<String>,
    pub guest_count: Option<i32>,
    pub items: Vec<OrderItemInput>,
    /// Menu items referenced by `items`, resolved by OrdersManager.
    pub menu: HashMap<i64, MenuItem>,
    /// Pre-generated outside the command transaction.
    pub order_number: String,
}

#[async_trait]
impl CommandHandler for OpenOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Validate the shape of the request
        if self.order_type == OrderType::DineIn && self.table_id.is_none() {
            return Err(OrderError::InvalidOperation(
                "dine-in orders require a table".to_string(),
            ));
        }
        if let Some(guests) = self.guest_count
            && guests <= 0
        {
            return Err(OrderError::InvalidOperation(format!(
                "guest count must be positive, got {}",
                guests
            )));
        }

        // 2. Freeze initial items against the catalog
        let mut frozen = Vec::with_capacity(self.items.len());
        for input in &self.items {
            let menu_item = self.menu.get(&input.menu_item_id).ok_or_else(|| {
                OrderError::NotFound(format!("menu item {}", input.menu_item_id))
            })?;
            frozen.push(money::freeze_item(menu_item, input)?);
        }

        // 3. Generate the order id and the opening event
        let order_id = util::uuid_v4();
        let mut events = vec![OrderEvent::new(
            ctx.next_sequence(),
            order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderOpened {
                order_number: self.order_number.clone(),
                order_type: self.order_type,
                table_id: self.table_id,
                table_name: self.table_name.clone(),
                guest_count: self.guest_count,
            },
        )];

        // 4. Initial items ride in a separate event so the applier
        //    logic is shared with later AddItems commands
        if !frozen.is_empty() {
            events.push(OrderEvent::new(
                ctx.next_sequence(),
                order_id,
                metadata.tenant_id,
                metadata.operator_id.clone(),
                metadata.operator_name.clone(),
                metadata.command_id.clone(),
                Some(metadata.timestamp),
                EventPayload::ItemsAdded { items: frozen },
            ));
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::tests::support::{latte_menu, test_metadata};
    use crate::storage::PosStorage;

    #[tokio::test]
    async fn test_open_order_emits_opened_event() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = OpenOrderAction {
            order_type: OrderType::Takeaway,
            table_id: None,
            table_name: None,
            guest_count: None,
            items: vec![],
            menu: HashMap::new(),
            order_number: "ORD20260824-10001".to_string(),
        };

        let events = action.execute(&mut ctx, &test_metadata()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 1);
        assert!(matches!(
            events[0].payload,
            EventPayload::OrderOpened { .. }
        ));
    }

    #[tokio::test]
    async fn test_open_order_with_items_emits_two_events() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let menu = latte_menu();
        let action = OpenOrderAction {
            order_type: OrderType::DineIn,
            table_id: Some(42),
            table_name: Some("T1".to_string()),
            guest_count: Some(2),
            items: vec![OrderItemInput {
                menu_item_id: 10,
                variant_id: None,
                modifier_ids: vec![],
                quantity: 2,
                note: None,
            }],
            menu,
            order_number: "ORD20260824-10002".to_string(),
        };

        let events = action.execute(&mut ctx, &test_metadata()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].sequence, 2);
        // Both events belong to the same freshly generated order
        assert_eq!(events[0].order_id, events[1].order_id);
        if let EventPayload::ItemsAdded { items } = &events[1].payload {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].line_subtotal, 7.0);
        } else {
            panic!("Expected ItemsAdded payload");
        }
    }

    #[tokio::test]
    async fn test_dine_in_requires_table() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = OpenOrderAction {
            order_type: OrderType::DineIn,
            table_id: None,
            table_name: None,
            guest_count: None,
            items: vec![],
            menu: HashMap::new(),
            order_number: "ORD20260824-10003".to_string(),
        };

        let result = action.execute(&mut ctx, &test_metadata()).await;
        assert!(matches!(result, Err(OrderError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_unknown_menu_item_rejected() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = OpenOrderAction {
            order_type: OrderType::Takeaway,
            table_id: None,
            table_name: None,
            guest_count: None,
            items: vec![OrderItemInput {
                menu_item_id: 999,
                variant_id: None,
                modifier_ids: vec![],
                quantity: 1,
                note: None,
            }],
            menu: HashMap::new(),
            order_number: "ORD20260824-10004".to_string(),
        };

        let result = action.execute(&mut ctx, &test_metadata()).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }
}
