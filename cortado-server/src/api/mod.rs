//! HTTP API handlers, one module per resource.

pub mod catalog;
pub mod context;
pub mod health;
pub mod orders;
pub mod stock;

pub use context::RequestContext;
