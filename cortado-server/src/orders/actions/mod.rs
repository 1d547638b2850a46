//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific command type.

use async_trait::async_trait;

use shared::order::{OrderCommand, OrderCommandPayload, OrderEvent, OrderSnapshot, OrderTransition};

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

mod add_items;
mod add_payment;
mod cancel_order;
mod complete_order;
mod confirm_order;
mod mark_ready;
mod mark_served;
mod open_order;
mod refund_order;
mod set_charges;
mod start_preparing;

pub use add_items::AddItemsAction;
pub use add_payment::AddPaymentAction;
pub use cancel_order::CancelOrderAction;
pub use complete_order::CompleteOrderAction;
pub use confirm_order::ConfirmOrderAction;
pub use mark_ready::MarkReadyAction;
pub use mark_served::MarkServedAction;
pub use open_order::OpenOrderAction;
pub use refund_order::RefundOrderAction;
pub use set_charges::SetChargesAction;
pub use start_preparing::StartPreparingAction;

/// Reject a lifecycle move the transition table does not allow.
pub(crate) fn guard_transition(
    snapshot: &OrderSnapshot,
    transition: OrderTransition,
) -> Result<(), OrderError> {
    if !transition.allowed_from(snapshot.status) {
        return Err(OrderError::InvalidTransition {
            current: snapshot.status.as_str().to_string(),
            attempted: transition.target().as_str().to_string(),
        });
    }
    Ok(())
}

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    OpenOrder(OpenOrderAction),
    AddItems(AddItemsAction),
    ConfirmOrder(ConfirmOrderAction),
    StartPreparing(StartPreparingAction),
    MarkReady(MarkReadyAction),
    MarkServed(MarkServedAction),
    CompleteOrder(CompleteOrderAction),
    CancelOrder(CancelOrderAction),
    AddPayment(AddPaymentAction),
    RefundOrder(RefundOrderAction),
    SetCharges(SetChargesAction),
}

#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::OpenOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::AddItems(action) => action.execute(ctx, metadata).await,
            CommandAction::ConfirmOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::StartPreparing(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkReady(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkServed(action) => action.execute(ctx, metadata).await,
            CommandAction::CompleteOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::AddPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::RefundOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::SetCharges(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert OrderCommand to CommandAction
///
/// This is the only place with a full match on OrderCommandPayload.
/// Commands that need injected catalog data (menu items, deduction
/// plans, pre-generated order numbers) are built by OrdersManager
/// instead and must not take this path.
impl From<&OrderCommand> for CommandAction {
    fn from(cmd: &OrderCommand) -> Self {
        match &cmd.payload {
            OrderCommandPayload::OpenOrder { .. } => {
                unreachable!("OpenOrder is built by OrdersManager with catalog data")
            }
            OrderCommandPayload::AddItems { .. } => {
                unreachable!("AddItems is built by OrdersManager with catalog data")
            }
            OrderCommandPayload::StartPreparing { .. } => {
                unreachable!("StartPreparing is built by OrdersManager with a deduction plan")
            }
            OrderCommandPayload::ConfirmOrder { order_id } => {
                CommandAction::ConfirmOrder(ConfirmOrderAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::MarkReady { order_id } => {
                CommandAction::MarkReady(MarkReadyAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::MarkServed { order_id } => {
                CommandAction::MarkServed(MarkServedAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::CompleteOrder { order_id } => {
                CommandAction::CompleteOrder(CompleteOrderAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::CancelOrder { order_id, reason } => {
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            OrderCommandPayload::AddPayment { order_id, payment } => {
                CommandAction::AddPayment(AddPaymentAction {
                    order_id: order_id.clone(),
                    payment: payment.clone(),
                })
            }
            OrderCommandPayload::RefundOrder { order_id, reason } => {
                CommandAction::RefundOrder(RefundOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            OrderCommandPayload::SetCharges {
                order_id,
                service_charge,
                discount,
            } => CommandAction::SetCharges(SetChargesAction {
                order_id: order_id.clone(),
                service_charge: *service_charge,
                discount: *discount,
            }),
        }
    }
}
