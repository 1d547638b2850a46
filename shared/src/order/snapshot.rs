//! Order snapshot: the current state of one order, derived by folding
//! its events in sequence order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::types::{OrderStatus, OrderType, PaymentMethod, PaymentStatus};
use crate::util;

/// A frozen modifier on an order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierSnapshot {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

/// One order line with its price frozen at the time it was added.
/// Later catalog edits never change an existing line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    /// Unique per line; two lines for the same menu item stay distinct.
    pub line_id: String,
    pub menu_item_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<ModifierSnapshot>,
    pub quantity: i32,
    /// Variant price (or base price) plus modifier prices, per unit.
    pub unit_price: f64,
    /// Percentage frozen from the menu item.
    pub tax_rate: f64,
    pub line_subtotal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A payment already taken. Payments are never edited, a refund flips
/// the order-level payment status instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub method: PaymentMethod,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub operator_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub tenant_id: i64,
    /// Human-facing number like ORD20260824-10001, unique per tenant.
    pub order_number: String,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<i32>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemSnapshot>,
    pub payments: Vec<PaymentRecord>,
    pub subtotal: f64,
    pub tax: f64,
    pub service_charge: f64,
    pub discount: f64,
    pub total: f64,
    pub paid_amount: f64,
    /// Set exactly once, when preparation starts. Guards against a
    /// second deduction even if events are replayed oddly.
    pub stock_deducted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparing_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Sequence of the last event folded into this snapshot.
    pub last_sequence: u64,
    /// Integrity checksum over the money-bearing fields.
    pub state_checksum: String,
}

impl OrderSnapshot {
    pub fn new(order_id: String, tenant_id: i64) -> Self {
        let now = util::now_millis();
        let mut snapshot = Self {
            order_id,
            tenant_id,
            order_number: String::new(),
            order_type: OrderType::DineIn,
            table_id: None,
            table_name: None,
            guest_count: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            items: Vec::new(),
            payments: Vec::new(),
            subtotal: 0.0,
            tax: 0.0,
            service_charge: 0.0,
            discount: 0.0,
            total: 0.0,
            paid_amount: 0.0,
            stock_deducted: false,
            confirmed_at: None,
            preparing_at: None,
            ready_at: None,
            served_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            refund_reason: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn remaining_amount(&self) -> f64 {
        (self.total - self.paid_amount).max(0.0)
    }

    /// Checksum over the fields that matter for money and ordering.
    /// Amounts are hashed as integer cents so float formatting noise
    /// cannot change the digest.
    pub fn compute_checksum(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.items.len().hash(&mut hasher);
        ((self.total * 100.0).round() as i64).hash(&mut hasher);
        ((self.paid_amount * 100.0).round() as i64).hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        self.status.as_str().hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}
