//! Order command processing: actions validate, appliers fold, the
//! manager runs the pipeline inside a single write transaction.

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod money;
pub mod traits;

#[cfg(test)]
pub(crate) mod tests;
