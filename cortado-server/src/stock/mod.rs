//! Stock: the movement ledger and the recipe resolver.

mod ledger;
mod resolver;

pub use ledger::{StockError, StockLedger, StockVerification};
pub use resolver::RecipeResolver;
