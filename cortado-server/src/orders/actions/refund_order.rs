//! RefundOrder command handler
//!
//! Marks an order's payments as returned. The payment records
//! themselves are kept; only the order-level payment status flips to
//! Refunded.

use async_trait::async_trait;

use shared::order::{EventPayload, OrderEvent, PaymentStatus};

use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// RefundOrder action
#[derive(Debug, Clone)]
pub struct RefundOrderAction {
    pub order_id: String,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for RefundOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.reason.trim().is_empty() {
            return Err(OrderError::InvalidOperation(
                "refund requires a reason".to_string(),
            ));
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;

        if snapshot.payments.is_empty() {
            return Err(OrderError::InvalidOperation(
                "order has no payments to refund".to_string(),
            ));
        }
        if snapshot.payment_status == PaymentStatus::Refunded {
            return Err(OrderError::InvalidOperation(
                "order has already been refunded".to_string(),
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
            EventPayload::OrderRefunded {
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}
