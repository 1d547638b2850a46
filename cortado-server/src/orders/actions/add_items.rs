//! AddItems command handler
//!
//! Appends lines to an order that has not started preparation yet.

use std::collections::HashMap;

use async_trait::async_trait;

use shared::models::MenuItem;
use shared::order::{EventPayload, OrderEvent, OrderItemInput, OrderStatus};

use crate::orders::money;
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// AddItems action
#[derive(Debug, Clone)]
pub struct AddItemsAction {
    pub order_id: String,
    pub items: Vec<OrderItemInput>,
    /// Menu items referenced by `items`, resolved by OrdersManager.
    pub menu: HashMap<i64, MenuItem>,
}

#[async_trait]
impl CommandHandler for AddItemsAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::InvalidOperation(
                "no items to add".to_string(),
            ));
        }

        // 1. Load and guard the order
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;

        // Items can only change before the kitchen starts working
        if !matches!(
            snapshot.status,
            OrderStatus::Pending | OrderStatus::Confirmed
        ) {
            return Err(OrderError::InvalidOperation(format!(
                "cannot add items to an order in status {}",
                snapshot.status.as_str()
            )));
        }

        // 2. Freeze prices against the catalog
        let mut frozen = Vec::with_capacity(self.items.len());
        for input in &self.items {
            let menu_item = self.menu.get(&input.menu_item_id).ok_or_else(|| {
                OrderError::NotFound(format!("menu item {}", input.menu_item_id))
            })?;
            frozen.push(money::freeze_item(menu_item, input)?);
        }

        // 3. Emit a single ItemsAdded event
        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::ItemsAdded { items: frozen },
        );

        Ok(vec![event])
    }
}
