//! MarkServed command handler

use async_trait::async_trait;

use shared::order::{EventPayload, OrderEvent, OrderTransition};

use crate::orders::actions::guard_transition;
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// MarkServed action
#[derive(Debug, Clone)]
pub struct MarkServedAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for MarkServedAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;
        guard_transition(&snapshot, OrderTransition::MarkServed)?;

        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderServed {},
        );

        Ok(vec![event])
    }
}
