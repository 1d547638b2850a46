//! Core order enums, command inputs, and the command response envelope.

use serde::{Deserialize, Serialize};

// ========== Order Status ==========

/// Order lifecycle status. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Served => "SERVED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

// ========== Status Transitions ==========

/// A named lifecycle transition. The allowed source states form the
/// whole transition table; everything not listed here is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Confirm,
    StartPreparing,
    MarkReady,
    MarkServed,
    Complete,
    Cancel,
}

impl OrderTransition {
    /// The status this transition moves the order into.
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderTransition::Confirm => OrderStatus::Confirmed,
            OrderTransition::StartPreparing => OrderStatus::Preparing,
            OrderTransition::MarkReady => OrderStatus::Ready,
            OrderTransition::MarkServed => OrderStatus::Served,
            OrderTransition::Complete => OrderStatus::Completed,
            OrderTransition::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Whether this transition is legal from the given status.
    pub fn allowed_from(&self, from: OrderStatus) -> bool {
        matches!(
            (self, from),
            (OrderTransition::Confirm, OrderStatus::Pending)
                | (OrderTransition::StartPreparing, OrderStatus::Confirmed)
                | (OrderTransition::MarkReady, OrderStatus::Preparing)
                | (OrderTransition::MarkServed, OrderStatus::Ready)
                | (OrderTransition::Complete, OrderStatus::Served)
                | (OrderTransition::Cancel, OrderStatus::Pending)
                | (OrderTransition::Cancel, OrderStatus::Confirmed)
        )
    }
}

// ========== Payment ==========

/// Derived from paid_amount vs total; never set directly by commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
    Voucher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

// ========== Command Inputs ==========

/// One requested order line, as sent by the client. Prices are never
/// trusted from the client; they are frozen from the catalog server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub modifier_ids: Vec<i64>,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A payment attempt. For cash, `tendered` may exceed `amount` and the
/// server computes change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

// ========== Command Response ==========

/// Envelope returned for every command, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command_id: String,
    pub success: bool,
    /// True when the command id was already processed and this response
    /// is a replay acknowledgement, not a new state change.
    #[serde(default)]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            duplicate: false,
            order_id,
            error: None,
        }
    }

    pub fn duplicate(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            duplicate: true,
            order_id,
            error: None,
        }
    }

    pub fn error(command_id: String, code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            command_id,
            success: false,
            duplicate: false,
            order_id: None,
            error: Some(CommandError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    OrderNotFound,
    NotFound,
    InvalidTransition,
    TenantMismatch,
    InsufficientStock,
    InvalidAmount,
    InvalidOperation,
    TableOccupied,
    InternalError,
}
