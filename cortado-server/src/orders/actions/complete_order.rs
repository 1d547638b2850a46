//! CompleteOrder command handler
//!
//! A served order can always be completed. Earlier non-terminal states
//! can be completed only when the order is fully paid, which covers
//! the takeaway flow where the customer pays and leaves before the
//! service steps are recorded.

use async_trait::async_trait;

use shared::order::{EventPayload, OrderEvent, OrderStatus, PaymentStatus};

use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// CompleteOrder action
#[derive(Debug, Clone)]
pub struct CompleteOrderAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for CompleteOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;

        let allowed = match snapshot.status {
            OrderStatus::Served => true,
            status if status.is_terminal() => false,
            _ => snapshot.payment_status == PaymentStatus::Paid,
        };
        if !allowed {
            return Err(OrderError::InvalidTransition {
                current: snapshot.status.as_str().to_string(),
                attempted: OrderStatus::Completed.as_str().to_string(),
            });
        }

        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderCompleted {
                final_total: snapshot.total,
            },
        );

        Ok(vec![event])
    }
}
