//! Money arithmetic using rust_decimal
//!
//! Amounts travel as f64 on the wire but every calculation goes
//! through `Decimal`, then rounds back: 2 decimal places for money,
//! 3 for ingredient quantities.

use rust_decimal::prelude::*;

use shared::models::MenuItem;
use shared::order::{
    ModifierSnapshot, OrderItemInput, OrderItemSnapshot, OrderSnapshot, PaymentInput,
    PaymentStatus,
};
use shared::util;

use crate::orders::traits::OrderError;

const MONEY_PLACES: u32 = 2;
const QUANTITY_PLACES: u32 = 3;

/// Tolerance for monetary comparisons (0.01).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

const MAX_PRICE: f64 = 1_000_000.0;
const MAX_QUANTITY: i32 = 9999;
const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(MONEY_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Round an ingredient quantity to 3 decimal places.
pub fn round_quantity(value: f64) -> f64 {
    to_decimal(value)
        .round_dp_with_strategy(QUANTITY_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

#[inline]
pub fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::InvalidOperation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate an OrderItemInput before freezing prices.
pub fn validate_item_input(item: &OrderItemInput) -> Result<(), OrderError> {
    if item.quantity <= 0 {
        return Err(OrderError::InvalidOperation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidOperation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Validate a PaymentInput before processing.
pub fn validate_payment(payment: &PaymentInput) -> Result<(), OrderError> {
    require_finite(payment.amount, "payment amount")?;
    if payment.amount <= 0.0 {
        return Err(OrderError::InvalidAmount);
    }
    if payment.amount > MAX_PAYMENT_AMOUNT {
        return Err(OrderError::InvalidAmount);
    }
    if let Some(tendered) = payment.tendered {
        require_finite(tendered, "tendered")?;
        if to_decimal(tendered) < to_decimal(payment.amount) - MONEY_TOLERANCE {
            return Err(OrderError::InvalidAmount);
        }
    }
    Ok(())
}

/// Validate service charge / discount values.
pub fn validate_charge(value: f64, field_name: &str) -> Result<(), OrderError> {
    require_finite(value, field_name)?;
    if value < 0.0 || value > MAX_PRICE {
        return Err(OrderError::InvalidAmount);
    }
    Ok(())
}

/// Freeze an order line from the current catalog state.
///
/// Unit price is the variant price (or base price when no variant)
/// plus the sum of modifier prices. The frozen line never changes when
/// the catalog does.
pub fn freeze_item(
    menu_item: &MenuItem,
    input: &OrderItemInput,
) -> Result<OrderItemSnapshot, OrderError> {
    validate_item_input(input)?;

    if !menu_item.is_active || !menu_item.is_available {
        return Err(OrderError::InvalidOperation(format!(
            "menu item {} is not available",
            menu_item.name
        )));
    }

    let (variant_name, base) = match input.variant_id {
        Some(variant_id) => {
            let variant = menu_item.variant(variant_id).ok_or_else(|| {
                OrderError::NotFound(format!(
                    "variant {} of menu item {}",
                    variant_id, menu_item.id
                ))
            })?;
            (Some(variant.name.clone()), to_decimal(variant.price))
        }
        None => (None, to_decimal(menu_item.base_price)),
    };

    let mut modifiers = Vec::new();
    let mut modifier_total = Decimal::ZERO;
    for modifier_id in &input.modifier_ids {
        let modifier = menu_item.modifier(*modifier_id).ok_or_else(|| {
            OrderError::NotFound(format!(
                "modifier {} of menu item {}",
                modifier_id, menu_item.id
            ))
        })?;
        modifier_total += to_decimal(modifier.price);
        modifiers.push(ModifierSnapshot {
            id: modifier.id,
            name: modifier.name.clone(),
            price: modifier.price,
        });
    }

    let unit_price = base + modifier_total;
    if to_f64(unit_price) > MAX_PRICE {
        return Err(OrderError::InvalidAmount);
    }
    let line_subtotal = unit_price * Decimal::from(input.quantity);

    Ok(OrderItemSnapshot {
        line_id: util::uuid_v4(),
        menu_item_id: menu_item.id,
        name: menu_item.name.clone(),
        variant_id: input.variant_id,
        variant_name,
        modifiers,
        quantity: input.quantity,
        unit_price: to_f64(unit_price),
        tax_rate: menu_item.tax_rate,
        line_subtotal: to_f64(line_subtotal),
        note: input.note.clone(),
    })
}

/// Recompute subtotal, tax and total from the frozen lines and the
/// order-level charges. Does NOT touch payment status.
pub fn recalculate_totals(snapshot: &mut OrderSnapshot) {
    let mut subtotal = Decimal::ZERO;
    let mut tax = Decimal::ZERO;

    for item in &snapshot.items {
        let line = to_decimal(item.line_subtotal);
        subtotal += line;
        tax += line * to_decimal(item.tax_rate) / Decimal::from(100);
    }

    let total = subtotal + tax + to_decimal(snapshot.service_charge)
        - to_decimal(snapshot.discount);

    snapshot.subtotal = to_f64(subtotal);
    snapshot.tax = to_f64(tax);
    snapshot.total = to_f64(total.max(Decimal::ZERO));
}

/// Derive the payment status from paid vs total.
///
/// Zero paid is always Unpaid, even on a zero-total order; Paid kicks
/// in once the remaining amount is within tolerance of zero, which
/// covers overpayment too.
pub fn derive_payment_status(paid_amount: f64, total: f64) -> PaymentStatus {
    let paid = to_decimal(paid_amount);
    let total = to_decimal(total);

    if paid <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else if paid >= total - MONEY_TOLERANCE {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Sum payment amounts with Decimal precision.
pub fn sum_payments(snapshot: &OrderSnapshot) -> f64 {
    let sum = snapshot
        .payments
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc + to_decimal(p.amount));
    to_f64(sum)
}
