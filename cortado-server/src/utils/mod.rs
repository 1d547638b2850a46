//! Shared server utilities.

mod error;
pub mod logger;

pub use error::{status_for, AppError, AppResult};
