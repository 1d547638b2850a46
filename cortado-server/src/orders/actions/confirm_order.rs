//! ConfirmOrder command handler

use async_trait::async_trait;

use shared::order::{EventPayload, OrderEvent, OrderTransition};

use crate::orders::actions::guard_transition;
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// ConfirmOrder action
#[derive(Debug, Clone)]
pub struct ConfirmOrderAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for ConfirmOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;
        guard_transition(&snapshot, OrderTransition::Confirm)?;

        // An empty order cannot go to the kitchen
        if snapshot.items.is_empty() {
            return Err(OrderError::InvalidOperation(
                "cannot confirm an order without items".to_string(),
            ));
        }

        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderConfirmed {},
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::tests::support::{store_order_with_items, store_order, test_metadata};
    use crate::storage::PosStorage;
    use shared::order::OrderStatus;

    #[tokio::test]
    async fn test_confirm_pending_order() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        store_order_with_items(&storage, &txn, "order-1", 1, OrderStatus::Pending);
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = ConfirmOrderAction {
            order_id: "order-1".to_string(),
        };
        let events = action.execute(&mut ctx, &test_metadata()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].payload, EventPayload::OrderConfirmed {}));
    }

    #[tokio::test]
    async fn test_confirm_empty_order_rejected() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        store_order(&storage, &txn, "order-1", 1, OrderStatus::Pending);
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = ConfirmOrderAction {
            order_id: "order-1".to_string(),
        };
        let result = action.execute(&mut ctx, &test_metadata()).await;
        assert!(matches!(result, Err(OrderError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_confirm_twice_rejected() {
        let storage = PosStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        store_order_with_items(&storage, &txn, "order-1", 1, OrderStatus::Confirmed);
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = ConfirmOrderAction {
            order_id: "order-1".to_string(),
        };
        let result = action.execute(&mut ctx, &test_metadata()).await;
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }
}
