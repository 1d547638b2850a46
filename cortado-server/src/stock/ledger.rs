//! Stock ledger
//!
//! Stock is an append-only ledger of movements; the ingredient's
//! `current_stock` is only a cached projection, rebuildable by replay.
//! Manual movements run in their own write transaction; order
//! deductions are applied inside the command transaction so they share
//! its fate.

use redb::WriteTransaction;
use rust_decimal::prelude::*;
use serde::Serialize;
use thiserror::Error;

use shared::models::Ingredient;
use shared::order::StockDeduction;
use shared::stock::{AdjustmentDirection, MovementInput, MovementKind, StockMovement};
use shared::util;

use crate::orders::money::{round_quantity, to_decimal};
use crate::storage::{PosStorage, StorageError};

#[derive(Debug, Error)]
pub enum StockError {
    #[error("Insufficient stock for {ingredient}: requested {requested}, available {available}")]
    Insufficient {
        ingredient: String,
        requested: f64,
        available: f64,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Adjustment movements require a direction")]
    MissingDirection,

    #[error("Invalid movement kind: {0}")]
    InvalidKind(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i64),

    #[error("Ingredient {0} belongs to another tenant")]
    TenantMismatch(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type StockResult<T> = Result<T, StockError>;

/// Result of comparing the cached stock level with a ledger replay.
#[derive(Debug, Clone, Serialize)]
pub struct StockVerification {
    pub ingredient_id: i64,
    pub cached_stock: f64,
    pub replayed_stock: f64,
    pub consistent: bool,
}

#[derive(Clone)]
pub struct StockLedger {
    storage: PosStorage,
}

impl StockLedger {
    pub fn new(storage: PosStorage) -> Self {
        Self { storage }
    }

    /// Record a manual movement (IN, OUT, ADJUSTMENT, WASTE).
    ///
    /// ORDER_DEDUCT is reserved for the order pipeline and rejected
    /// here. Quantity is a positive magnitude; the kind (plus the
    /// direction for adjustments) fixes the sign.
    pub fn record_movement(
        &self,
        tenant_id: i64,
        input: &MovementInput,
        operator_id: &str,
        operator_name: &str,
    ) -> StockResult<StockMovement> {
        if input.kind == MovementKind::OrderDeduct {
            return Err(StockError::InvalidKind(
                "ORDER_DEDUCT movements are recorded by the order pipeline".to_string(),
            ));
        }
        if !input.quantity.is_finite() || input.quantity <= 0.0 {
            return Err(StockError::InvalidQuantity(format!(
                "quantity must be positive, got {}",
                input.quantity
            )));
        }

        let signed_effect = match input.kind {
            MovementKind::In => to_decimal(input.quantity),
            MovementKind::Out | MovementKind::Waste => -to_decimal(input.quantity),
            MovementKind::Adjustment => match input.direction {
                Some(AdjustmentDirection::Increase) => to_decimal(input.quantity),
                Some(AdjustmentDirection::Decrease) => -to_decimal(input.quantity),
                None => return Err(StockError::MissingDirection),
            },
            MovementKind::OrderDeduct => unreachable!(),
        };

        let txn = self.storage.begin_write()?;
        let movement = self.append_movement(
            &txn,
            tenant_id,
            input.ingredient_id,
            input.kind,
            signed_effect,
            input.unit_cost,
            input.reference.clone(),
            operator_id,
            operator_name,
        )?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            tenant_id,
            ingredient_id = movement.ingredient_id,
            kind = ?movement.kind,
            signed_effect = movement.signed_effect,
            resulting_stock = movement.resulting_stock,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    /// Apply an order's deduction plan inside an already-open command
    /// transaction. Any insufficiency fails the whole command: the
    /// caller aborts the transaction, so no partial deduction survives.
    pub fn apply_deductions_txn(
        &self,
        txn: &WriteTransaction,
        tenant_id: i64,
        order_number: &str,
        deductions: &[StockDeduction],
        operator_id: &str,
        operator_name: &str,
    ) -> StockResult<Vec<StockMovement>> {
        let mut movements = Vec::with_capacity(deductions.len());
        for deduction in deductions {
            if !deduction.quantity.is_finite() || deduction.quantity <= 0.0 {
                return Err(StockError::InvalidQuantity(format!(
                    "deduction must be positive, got {}",
                    deduction.quantity
                )));
            }
            movements.push(self.append_movement(
                txn,
                tenant_id,
                deduction.ingredient_id,
                MovementKind::OrderDeduct,
                -to_decimal(deduction.quantity),
                None,
                Some(order_number.to_string()),
                operator_id,
                operator_name,
            )?);
        }
        Ok(movements)
    }

    /// Append one movement and move the cached level with it.
    #[allow(clippy::too_many_arguments)]
    fn append_movement(
        &self,
        txn: &WriteTransaction,
        tenant_id: i64,
        ingredient_id: i64,
        kind: MovementKind,
        signed_effect: Decimal,
        unit_cost: Option<f64>,
        reference: Option<String>,
        operator_id: &str,
        operator_name: &str,
    ) -> StockResult<StockMovement> {
        let mut ingredient = self
            .storage
            .get_ingredient_txn(txn, ingredient_id)?
            .ok_or(StockError::IngredientNotFound(ingredient_id))?;
        if ingredient.tenant_id != tenant_id {
            return Err(StockError::TenantMismatch(ingredient_id));
        }

        let resulting = to_decimal(ingredient.current_stock) + signed_effect;
        if resulting < Decimal::ZERO {
            return Err(StockError::Insufficient {
                ingredient: ingredient.name.clone(),
                requested: round_quantity(-signed_effect.to_f64().unwrap_or(0.0)),
                available: ingredient.current_stock,
            });
        }
        let resulting_stock = round_quantity(resulting.to_f64().unwrap_or(0.0));

        let movement = StockMovement {
            id: self.storage.next_movement_id_txn(txn)?,
            tenant_id,
            ingredient_id,
            kind,
            signed_effect: round_quantity(signed_effect.to_f64().unwrap_or(0.0)),
            resulting_stock,
            unit_cost,
            reference,
            operator_id: operator_id.to_string(),
            operator_name: operator_name.to_string(),
            created_at: util::now_millis(),
        };
        self.storage.store_movement(txn, &movement)?;

        ingredient.current_stock = resulting_stock;
        ingredient.updated_at = movement.created_at;
        self.storage.store_ingredient_txn(txn, &ingredient)?;

        Ok(movement)
    }

    // ========== Queries ==========

    pub fn movements(&self, tenant_id: i64) -> StockResult<Vec<StockMovement>> {
        Ok(self.storage.get_movements(tenant_id)?)
    }

    pub fn movements_for_ingredient(
        &self,
        tenant_id: i64,
        ingredient_id: i64,
    ) -> StockResult<Vec<StockMovement>> {
        Ok(self
            .storage
            .get_movements(tenant_id)?
            .into_iter()
            .filter(|m| m.ingredient_id == ingredient_id)
            .collect())
    }

    /// Rebuild the stock level of one ingredient from its ledger.
    ///
    /// Stock starts at zero and every unit arrives through a movement,
    /// so folding the signed effects reproduces the level from scratch.
    pub fn replay_stock(&self, tenant_id: i64, ingredient_id: i64) -> StockResult<f64> {
        let ingredient = self
            .storage
            .get_ingredient(ingredient_id)?
            .ok_or(StockError::IngredientNotFound(ingredient_id))?;
        if ingredient.tenant_id != tenant_id {
            return Err(StockError::TenantMismatch(ingredient_id));
        }

        let total = self
            .movements_for_ingredient(tenant_id, ingredient_id)?
            .iter()
            .fold(Decimal::ZERO, |acc, m| acc + to_decimal(m.signed_effect));
        Ok(round_quantity(total.to_f64().unwrap_or(0.0)))
    }

    /// Replay the ledger and compare it against the cached level.
    ///
    /// Consistent means the fold of signed effects matches the cache
    /// AND every movement's recorded `resulting_stock` matches the
    /// running fold at that point.
    pub fn verify(&self, tenant_id: i64, ingredient_id: i64) -> StockResult<StockVerification> {
        let ingredient = self
            .storage
            .get_ingredient(ingredient_id)?
            .ok_or(StockError::IngredientNotFound(ingredient_id))?;
        if ingredient.tenant_id != tenant_id {
            return Err(StockError::TenantMismatch(ingredient_id));
        }

        let tolerance = Decimal::new(1, 3);
        let mut running = Decimal::ZERO;
        let mut chain_intact = true;
        for movement in self.movements_for_ingredient(tenant_id, ingredient_id)? {
            running += to_decimal(movement.signed_effect);
            if (running - to_decimal(movement.resulting_stock)).abs() >= tolerance {
                chain_intact = false;
            }
        }
        let replayed = round_quantity(running.to_f64().unwrap_or(0.0));

        Ok(StockVerification {
            ingredient_id,
            cached_stock: ingredient.current_stock,
            replayed_stock: replayed,
            consistent: chain_intact
                && (to_decimal(ingredient.current_stock) - running).abs() < tolerance,
        })
    }

    /// Ingredients at or below their minimum level.
    pub fn low_stock(&self, tenant_id: i64) -> StockResult<Vec<Ingredient>> {
        Ok(self
            .storage
            .get_ingredients(tenant_id)?
            .into_iter()
            .filter(|i| i.is_active && i.is_low_stock())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_ingredient(id: i64, name: &str, unit: &str, minimum_stock: f64) -> Ingredient {
        Ingredient {
            id,
            tenant_id: 1,
            name: name.to_string(),
            unit: unit.to_string(),
            current_stock: 0.0,
            minimum_stock,
            cost_per_unit: 0.02,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Beans (id 5) at 100g, arrived through an In movement so the
    /// ledger supports the cached level from the start.
    fn seeded() -> (StockLedger, PosStorage, Ingredient) {
        let storage = PosStorage::open_in_memory().unwrap();
        storage
            .store_ingredient(&empty_ingredient(5, "Espresso beans", "g", 20.0))
            .unwrap();
        let ledger = StockLedger::new(storage.clone());
        ledger
            .record_movement(1, &movement_input(MovementKind::In, 100.0), "op-1", "Ana")
            .unwrap();
        let ingredient = storage.get_ingredient(5).unwrap().unwrap();
        (ledger, storage, ingredient)
    }

    fn movement_input(kind: MovementKind, quantity: f64) -> MovementInput {
        MovementInput {
            ingredient_id: 5,
            kind,
            quantity,
            direction: None,
            unit_cost: None,
            reference: None,
        }
    }

    #[test]
    fn test_in_movement_increases_stock() {
        let (ledger, storage, _) = seeded();
        let movement = ledger
            .record_movement(1, &movement_input(MovementKind::In, 50.0), "op-1", "Ana")
            .unwrap();

        assert_eq!(movement.signed_effect, 50.0);
        assert_eq!(movement.resulting_stock, 150.0);
        assert_eq!(storage.get_ingredient(5).unwrap().unwrap().current_stock, 150.0);
    }

    #[test]
    fn test_out_movement_decreases_stock() {
        let (ledger, _, _) = seeded();
        let movement = ledger
            .record_movement(1, &movement_input(MovementKind::Out, 30.0), "op-1", "Ana")
            .unwrap();
        assert_eq!(movement.signed_effect, -30.0);
        assert_eq!(movement.resulting_stock, 70.0);
    }

    #[test]
    fn test_adjustment_requires_direction() {
        let (ledger, _, _) = seeded();
        let result = ledger.record_movement(
            1,
            &movement_input(MovementKind::Adjustment, 10.0),
            "op-1",
            "Ana",
        );
        assert!(matches!(result, Err(StockError::MissingDirection)));

        let mut with_direction = movement_input(MovementKind::Adjustment, 10.0);
        with_direction.direction = Some(AdjustmentDirection::Decrease);
        let movement = ledger
            .record_movement(1, &with_direction, "op-1", "Ana")
            .unwrap();
        assert_eq!(movement.resulting_stock, 90.0);
    }

    #[test]
    fn test_negative_stock_blocked() {
        let (ledger, storage, _) = seeded();
        let result = ledger.record_movement(
            1,
            &movement_input(MovementKind::Waste, 150.0),
            "op-1",
            "Ana",
        );
        assert!(matches!(result, Err(StockError::Insufficient { .. })));
        // Nothing beyond the seed movement was written
        assert_eq!(storage.get_ingredient(5).unwrap().unwrap().current_stock, 100.0);
        assert_eq!(ledger.movements(1).unwrap().len(), 1);
    }

    #[test]
    fn test_order_deduct_rejected_as_manual_movement() {
        let (ledger, _, _) = seeded();
        let result = ledger.record_movement(
            1,
            &movement_input(MovementKind::OrderDeduct, 10.0),
            "op-1",
            "Ana",
        );
        assert!(matches!(result, Err(StockError::InvalidKind(_))));
    }

    #[test]
    fn test_deductions_all_or_nothing_on_abort() {
        let (ledger, storage, _) = seeded();
        storage
            .store_ingredient(&empty_ingredient(6, "Milk", "ml", 0.0))
            .unwrap();
        let mut milk_in = movement_input(MovementKind::In, 10.0);
        milk_in.ingredient_id = 6;
        ledger.record_movement(1, &milk_in, "op-1", "Ana").unwrap();

        let txn = storage.begin_write().unwrap();
        let result = ledger.apply_deductions_txn(
            &txn,
            1,
            "ORD20260824-10001",
            &[
                StockDeduction {
                    ingredient_id: 5,
                    quantity: 40.0,
                },
                StockDeduction {
                    ingredient_id: 6,
                    quantity: 50.0, // only 10 available
                },
            ],
            "op-1",
            "Ana",
        );
        assert!(matches!(result, Err(StockError::Insufficient { .. })));
        txn.abort().unwrap();

        // The first deduction did not leak through the aborted txn
        assert_eq!(storage.get_ingredient(5).unwrap().unwrap().current_stock, 100.0);
        assert_eq!(storage.get_ingredient(6).unwrap().unwrap().current_stock, 10.0);
        // Only the two seed movements remain
        assert_eq!(ledger.movements(1).unwrap().len(), 2);
    }

    #[test]
    fn test_deduction_references_order_number() {
        let (ledger, storage, _) = seeded();
        let txn = storage.begin_write().unwrap();
        let movements = ledger
            .apply_deductions_txn(
                &txn,
                1,
                "ORD20260824-10001",
                &[StockDeduction {
                    ingredient_id: 5,
                    quantity: 36.0,
                }],
                "op-1",
                "Ana",
            )
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::OrderDeduct);
        assert_eq!(
            movements[0].reference.as_deref(),
            Some("ORD20260824-10001")
        );
        assert_eq!(movements[0].resulting_stock, 64.0);
    }

    #[test]
    fn test_replay_matches_cached_level() {
        let (ledger, _, _) = seeded();
        ledger
            .record_movement(1, &movement_input(MovementKind::In, 25.5), "op-1", "Ana")
            .unwrap();
        ledger
            .record_movement(1, &movement_input(MovementKind::Waste, 5.25), "op-1", "Ana")
            .unwrap();

        let verification = ledger.verify(1, 5).unwrap();
        assert!(verification.consistent);
        assert_eq!(verification.cached_stock, 120.25);
        assert_eq!(verification.replayed_stock, 120.25);
    }

    #[test]
    fn test_verify_flags_cache_without_movements() {
        let (ledger, storage, _) = seeded();
        // A cached level no ledger entry supports
        let mut phantom = empty_ingredient(7, "Syrup", "ml", 0.0);
        phantom.current_stock = 50.0;
        storage.store_ingredient(&phantom).unwrap();

        let verification = ledger.verify(1, 7).unwrap();
        assert!(!verification.consistent);
        assert_eq!(verification.cached_stock, 50.0);
        assert_eq!(verification.replayed_stock, 0.0);
    }

    #[test]
    fn test_verify_flags_tampered_cache() {
        let (ledger, storage, mut ingredient) = seeded();
        assert!(ledger.verify(1, 5).unwrap().consistent);

        ingredient.current_stock = 130.0;
        storage.store_ingredient(&ingredient).unwrap();

        let verification = ledger.verify(1, 5).unwrap();
        assert!(!verification.consistent);
        assert_eq!(verification.cached_stock, 130.0);
        assert_eq!(verification.replayed_stock, 100.0);
    }

    #[test]
    fn test_low_stock_report() {
        let (ledger, _, _) = seeded();
        // Drop below the minimum of 20
        ledger
            .record_movement(1, &movement_input(MovementKind::Out, 85.0), "op-1", "Ana")
            .unwrap();

        let low = ledger.low_stock(1).unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, 5);
    }

    #[test]
    fn test_tenant_cannot_move_foreign_stock() {
        let (ledger, _, _) = seeded();
        let result = ledger.record_movement(
            2,
            &movement_input(MovementKind::In, 10.0),
            "op-1",
            "Ana",
        );
        assert!(matches!(result, Err(StockError::TenantMismatch(_))));
    }
}
