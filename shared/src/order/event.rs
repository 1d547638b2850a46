//! Order events: the append-only record every snapshot is folded from.

use serde::{Deserialize, Serialize};

use super::command::OrderCommand;
use super::snapshot::OrderItemSnapshot;
use super::types::{OrderType, PaymentMethod};
use crate::util;

/// One ingredient quantity consumed when preparation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDeduction {
    pub ingredient_id: i64,
    pub quantity: f64,
}

/// An immutable fact about one order. Events are totally ordered per
/// tenant by `sequence` and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_id: String,
    /// Tenant-wide monotonic sequence, assigned inside the write txn.
    pub sequence: u64,
    pub order_id: String,
    pub tenant_id: i64,
    /// Server-side timestamp, authoritative.
    pub timestamp: i64,
    /// Client timestamp from the originating command, informational.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    pub operator_id: String,
    pub operator_name: String,
    pub command_id: String,
    pub payload: EventPayload,
}

impl OrderEvent {
    pub fn new(
        sequence: u64,
        order_id: String,
        tenant_id: i64,
        operator_id: String,
        operator_name: String,
        command_id: String,
        client_timestamp: Option<i64>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: util::uuid_v4(),
            sequence,
            order_id,
            tenant_id,
            timestamp: util::now_millis(),
            client_timestamp,
            operator_id,
            operator_name,
            command_id,
            payload,
        }
    }

    /// Build an event carrying the command's operator attribution.
    pub fn from_command(
        command: &OrderCommand,
        sequence: u64,
        order_id: String,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            sequence,
            order_id,
            command.tenant_id,
            command.operator_id.clone(),
            command.operator_name.clone(),
            command.command_id.clone(),
            Some(command.timestamp),
            payload,
        )
    }

    /// Stable event kind name, used for logging and filtering.
    pub fn kind(&self) -> &'static str {
        match &self.payload {
            EventPayload::OrderOpened { .. } => "ORDER_OPENED",
            EventPayload::ItemsAdded { .. } => "ITEMS_ADDED",
            EventPayload::OrderConfirmed {} => "ORDER_CONFIRMED",
            EventPayload::PreparationStarted { .. } => "PREPARATION_STARTED",
            EventPayload::OrderReady {} => "ORDER_READY",
            EventPayload::OrderServed {} => "ORDER_SERVED",
            EventPayload::OrderCompleted { .. } => "ORDER_COMPLETED",
            EventPayload::OrderCancelled { .. } => "ORDER_CANCELLED",
            EventPayload::PaymentAdded { .. } => "PAYMENT_ADDED",
            EventPayload::OrderRefunded { .. } => "ORDER_REFUNDED",
            EventPayload::ChargesSet { .. } => "CHARGES_SET",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderOpened {
        order_number: String,
        order_type: OrderType,
        #[serde(skip_serializing_if = "Option::is_none")]
        table_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        guest_count: Option<i32>,
    },
    /// Items carry catalog prices frozen at the moment of the command.
    ItemsAdded {
        items: Vec<OrderItemSnapshot>,
    },
    OrderConfirmed {},
    /// The deductions recorded here were applied to the stock ledger in
    /// the same transaction that persisted this event.
    PreparationStarted {
        deductions: Vec<StockDeduction>,
    },
    OrderReady {},
    OrderServed {},
    OrderCompleted {
        final_total: f64,
    },
    OrderCancelled {
        reason: String,
    },
    PaymentAdded {
        payment_id: String,
        method: PaymentMethod,
        amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        tendered: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        change: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    OrderRefunded {
        reason: String,
    },
    ChargesSet {
        service_charge: f64,
        discount: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderCommandPayload;

    #[test]
    fn test_from_command_carries_attribution() {
        let cmd = OrderCommand::new(
            7,
            "op-3".to_string(),
            "Rui".to_string(),
            OrderCommandPayload::ConfirmOrder {
                order_id: "order-1".to_string(),
            },
        );
        let event = OrderEvent::from_command(
            &cmd,
            12,
            "order-1".to_string(),
            EventPayload::OrderConfirmed {},
        );

        assert_eq!(event.sequence, 12);
        assert_eq!(event.tenant_id, 7);
        assert_eq!(event.operator_id, "op-3");
        assert_eq!(event.command_id, cmd.command_id);
        assert_eq!(event.client_timestamp, Some(cmd.timestamp));
        assert_eq!(event.kind(), "ORDER_CONFIRMED");
    }

    #[test]
    fn test_payload_tag_matches_kind() {
        let cmd = OrderCommand::new(
            1,
            "op-1".to_string(),
            "Ana".to_string(),
            OrderCommandPayload::ConfirmOrder {
                order_id: "order-1".to_string(),
            },
        );
        let event = OrderEvent::from_command(
            &cmd,
            1,
            "order-1".to_string(),
            EventPayload::PreparationStarted {
                deductions: vec![StockDeduction {
                    ingredient_id: 5,
                    quantity: 18.0,
                }],
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["payload"]["type"], event.kind());
    }
}
