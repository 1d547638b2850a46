//! Recipe resolver
//!
//! Turns the frozen lines of an order into an aggregated deduction
//! plan: per-ingredient totals, so one order touches each ingredient
//! at most once regardless of how many lines consume it.

use std::collections::BTreeMap;
use std::sync::Arc;

use shared::order::{OrderItemSnapshot, StockDeduction};

use crate::catalog::{CatalogError, CatalogService};
use crate::orders::money::round_quantity;

#[derive(Clone)]
pub struct RecipeResolver {
    catalog: Arc<CatalogService>,
}

impl RecipeResolver {
    pub fn new(catalog: Arc<CatalogService>) -> Self {
        Self { catalog }
    }

    /// Build the deduction plan for a set of order lines.
    ///
    /// Recipes are keyed by menu item, not by variant: a large latte
    /// consumes the same recipe as a regular one. Items without a
    /// recipe contribute nothing. Quantities are aggregated per
    /// ingredient and rounded to 3 decimal places.
    pub fn deduction_plan(
        &self,
        items: &[OrderItemSnapshot],
    ) -> Result<Vec<StockDeduction>, CatalogError> {
        let mut totals: BTreeMap<i64, f64> = BTreeMap::new();
        for item in items {
            for line in self.catalog.recipes_for(item.menu_item_id)? {
                let needed = line.quantity_needed * item.quantity as f64;
                *totals.entry(line.ingredient_id).or_insert(0.0) += needed;
            }
        }

        Ok(totals
            .into_iter()
            .map(|(ingredient_id, quantity)| StockDeduction {
                ingredient_id,
                quantity: round_quantity(quantity),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{MenuItem, Recipe};
    use shared::order::ModifierSnapshot;
    use shared::util;

    use crate::storage::PosStorage;

    fn line(menu_item_id: i64, quantity: i32) -> OrderItemSnapshot {
        OrderItemSnapshot {
            line_id: util::uuid_v4(),
            menu_item_id,
            name: format!("Item {menu_item_id}"),
            variant_id: None,
            variant_name: None,
            modifiers: Vec::<ModifierSnapshot>::new(),
            quantity,
            unit_price: 3.0,
            tax_rate: 0.0,
            line_subtotal: 3.0 * quantity as f64,
            note: None,
        }
    }

    fn seeded_catalog() -> Arc<CatalogService> {
        let storage = PosStorage::open_in_memory().unwrap();
        let now = util::now_millis();
        for id in [10_i64, 11] {
            storage
                .store_menu_item(&MenuItem {
                    id,
                    tenant_id: 1,
                    name: format!("Item {id}"),
                    base_price: 3.0,
                    tax_rate: 0.0,
                    variants: Vec::new(),
                    modifiers: Vec::new(),
                    is_active: true,
                    is_available: true,
                    created_at: now,
                    updated_at: now,
                })
                .unwrap();
        }
        // Both items share ingredient 5; item 10 also uses 6
        storage
            .store_recipes(
                10,
                &[
                    Recipe {
                        menu_item_id: 10,
                        ingredient_id: 5,
                        quantity_needed: 18.0,
                    },
                    Recipe {
                        menu_item_id: 10,
                        ingredient_id: 6,
                        quantity_needed: 150.0,
                    },
                ],
            )
            .unwrap();
        storage
            .store_recipes(
                11,
                &[Recipe {
                    menu_item_id: 11,
                    ingredient_id: 5,
                    quantity_needed: 7.5,
                }],
            )
            .unwrap();
        Arc::new(CatalogService::new(storage))
    }

    #[test]
    fn test_plan_aggregates_per_ingredient() {
        let resolver = RecipeResolver::new(seeded_catalog());
        let plan = resolver
            .deduction_plan(&[line(10, 2), line(11, 3)])
            .unwrap();

        assert_eq!(plan.len(), 2);
        // ingredient 5: 18 * 2 + 7.5 * 3 = 58.5; ingredient 6: 150 * 2
        assert_eq!(plan[0].ingredient_id, 5);
        assert_eq!(plan[0].quantity, 58.5);
        assert_eq!(plan[1].ingredient_id, 6);
        assert_eq!(plan[1].quantity, 300.0);
    }

    #[test]
    fn test_items_without_recipe_deduct_nothing() {
        let resolver = RecipeResolver::new(seeded_catalog());
        let plan = resolver.deduction_plan(&[line(99, 1)]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_fractional_quantities_rounded() {
        let resolver = RecipeResolver::new(seeded_catalog());
        // 7.5 * 1 stays exact; exercise the rounding path with qty 3
        let plan = resolver.deduction_plan(&[line(11, 1)]).unwrap();
        assert_eq!(plan[0].quantity, 7.5);
    }
}
