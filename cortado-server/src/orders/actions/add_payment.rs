//! AddPayment command handler
//!
//! Adds a payment to a live order. Overpayment is accepted (the order
//! just becomes Paid); underpaying tendered cash is not.

use async_trait::async_trait;
use rust_decimal::Decimal;

use shared::order::{EventPayload, OrderEvent, PaymentInput, PaymentStatus};
use shared::util;

use crate::orders::money::{self, to_decimal, to_f64};
use crate::orders::traits::{
    ensure_tenant, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// AddPayment action
#[derive(Debug, Clone)]
pub struct AddPaymentAction {
    pub order_id: String,
    pub payment: PaymentInput,
}

#[async_trait]
impl CommandHandler for AddPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Validate payment input (finite, positive, tendered covers amount)
        money::validate_payment(&self.payment)?;

        // 2. Load and guard the order
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_tenant(&snapshot, metadata.tenant_id)?;

        if snapshot.is_terminal() {
            return Err(OrderError::InvalidOperation(format!(
                "cannot add payment to an order in status {}",
                snapshot.status.as_str()
            )));
        }
        if snapshot.payment_status == PaymentStatus::Refunded {
            return Err(OrderError::InvalidOperation(
                "order has been refunded".to_string(),
            ));
        }

        // 3. Calculate change for cash payments
        let change = self.payment.tendered.map(|t| {
            let diff = to_decimal(t) - to_decimal(self.payment.amount);
            to_f64(diff.max(Decimal::ZERO))
        });

        // 4. Emit the event
        let event = OrderEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id,
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::PaymentAdded {
                payment_id: util::uuid_v4(),
                method: self.payment.method,
                amount: self.payment.amount,
                tendered: self.payment.tendered,
                change,
                reference: self.payment.reference.clone(),
            },
        );

        Ok(vec![event])
    }
}
