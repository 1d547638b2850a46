//! StartPreparing command handler
//!
//! Moves a confirmed order into Preparing and records the ingredient
//! deductions the kitchen run will consume. The deduction plan is
//! resolved from the recipes by OrdersManager; the ledger applies it
//! in the same transaction that persists the event, so either both
//! happen or neither does.

use async_trait::async_trait;

use shared::order::{EventPayload, OrderEvent, OrderTransition, StockDeduction};

use crate::orders::actions::guard_transition;
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// StartPreparing action
#[derive(Debug, Clone)]
pub struct StartPreparingAction {
    pub order_id: String,
    /// Aggregated per-ingredient quantities, resolved by OrdersManager.
    pub deductions: Vec<StockDeduction>,
}

#[async_trait]
impl CommandHandler for StartPreparingAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;
        guard_transition(&snapshot, OrderTransition::StartPreparing)?;

        // The status guard already implies this, but a snapshot that
        // somehow deducted twice would corrupt the ledger
        if snapshot.stock_deducted {
            return Err(OrderError::InvalidOperation(
                "stock already deducted for this order".to_string(),
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
            EventPayload::PreparationStarted {
                deductions: self.deductions.clone(),
            },
        );

        Ok(vec![event])
    }
}
