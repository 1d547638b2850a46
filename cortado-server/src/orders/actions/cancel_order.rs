//! CancelOrder command handler
//!
//! Cancellation is only possible before preparation starts; once stock
//! has been consumed the order has to run its course.

use async_trait::async_trait;

use shared::order::{EventPayload, OrderEvent, OrderTransition};

use crate::orders::actions::guard_transition;
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.reason.trim().is_empty() {
            return Err(OrderError::InvalidOperation(
                "cancellation requires a reason".to_string(),
            ));
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;
        guard_transition(&snapshot, OrderTransition::Cancel)?;

        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderCancelled {
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}
