//! Order commands: the write-side API of the order core.

use serde::{Deserialize, Serialize};

use super::types::{OrderItemInput, OrderType, PaymentInput};
use crate::util;

/// A client intent targeting one order (or opening a new one).
///
/// `command_id` is the idempotency key: the same id is never executed
/// twice, the second attempt gets a duplicate acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    pub command_id: String,
    pub tenant_id: i64,
    pub operator_id: String,
    pub operator_name: String,
    /// Client-side timestamp, informational only.
    pub timestamp: i64,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(
        tenant_id: i64,
        operator_id: String,
        operator_name: String,
        payload: OrderCommandPayload,
    ) -> Self {
        Self {
            command_id: util::uuid_v4(),
            tenant_id,
            operator_id,
            operator_name,
            timestamp: util::now_millis(),
            payload,
        }
    }

    /// The order this command targets, if it targets an existing one.
    pub fn order_id(&self) -> Option<&str> {
        match &self.payload {
            OrderCommandPayload::OpenOrder { .. } => None,
            OrderCommandPayload::AddItems { order_id, .. }
            | OrderCommandPayload::ConfirmOrder { order_id }
            | OrderCommandPayload::StartPreparing { order_id }
            | OrderCommandPayload::MarkReady { order_id }
            | OrderCommandPayload::MarkServed { order_id }
            | OrderCommandPayload::CompleteOrder { order_id }
            | OrderCommandPayload::CancelOrder { order_id, .. }
            | OrderCommandPayload::AddPayment { order_id, .. }
            | OrderCommandPayload::RefundOrder { order_id, .. }
            | OrderCommandPayload::SetCharges { order_id, .. } => Some(order_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    OpenOrder {
        order_type: OrderType,
        #[serde(skip_serializing_if = "Option::is_none")]
        table_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        guest_count: Option<i32>,
        #[serde(default)]
        items: Vec<OrderItemInput>,
    },
    AddItems {
        order_id: String,
        items: Vec<OrderItemInput>,
    },
    ConfirmOrder {
        order_id: String,
    },
    StartPreparing {
        order_id: String,
    },
    MarkReady {
        order_id: String,
    },
    MarkServed {
        order_id: String,
    },
    CompleteOrder {
        order_id: String,
    },
    CancelOrder {
        order_id: String,
        reason: String,
    },
    AddPayment {
        order_id: String,
        payment: PaymentInput,
    },
    RefundOrder {
        order_id: String,
        reason: String,
    },
    SetCharges {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        service_charge: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        discount: Option<f64>,
    },
}
