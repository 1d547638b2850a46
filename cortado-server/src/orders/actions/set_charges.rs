//! SetCharges command handler
//!
//! Sets the order-level service charge and discount. Only possible
//! before the kitchen starts; omitted fields keep their current value.

use async_trait::async_trait;
use rust_decimal::Decimal;

use shared::order::{EventPayload, OrderEvent, OrderStatus};

use crate::orders::money::{self, to_decimal};
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// SetCharges action
#[derive(Debug, Clone)]
pub struct SetChargesAction {
    pub order_id: String,
    pub service_charge: Option<f64>,
    pub discount: Option<f64>,
}

#[async_trait]
impl CommandHandler for SetChargesAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;

        if !matches!(
            snapshot.status,
            OrderStatus::Pending | OrderStatus::Confirmed
        ) {
            return Err(OrderError::InvalidOperation(format!(
                "cannot change charges in status {}",
                snapshot.status.as_str()
            )));
        }

        let service_charge = self.service_charge.unwrap_or(snapshot.service_charge);
        let discount = self.discount.unwrap_or(snapshot.discount);
        money::validate_charge(service_charge, "service_charge")?;
        money::validate_charge(discount, "discount")?;

        // A discount may not push the total below zero
        let gross: Decimal =
            to_decimal(snapshot.subtotal) + to_decimal(snapshot.tax) + to_decimal(service_charge);
        if to_decimal(discount) > gross {
            return Err(OrderError::InvalidAmount);
        }

        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::ChargesSet {
                service_charge,
                discount,
            },
        );

        Ok(vec![event])
    }
}
