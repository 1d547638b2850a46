//! Manager error type and its mapping onto wire error codes.

use thiserror::Error;

use shared::order::CommandErrorCode;

use crate::catalog::CatalogError;
use crate::orders::traits::OrderError;
use crate::stock::StockError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Tenant not found: {0}")]
    TenantNotFound(i64),

    #[error("Tenant is inactive: {0}")]
    TenantInactive(i64),

    #[error("Table is already occupied: {0}")]
    TableOccupied(String),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

impl ManagerError {
    /// Wire error code for the command response.
    pub fn code(&self) -> CommandErrorCode {
        match self {
            ManagerError::Storage(_) => CommandErrorCode::InternalError,
            ManagerError::Order(err) => match err {
                OrderError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
                OrderError::InvalidTransition { .. } => CommandErrorCode::InvalidTransition,
                OrderError::TenantMismatch { .. } => CommandErrorCode::TenantMismatch,
                OrderError::InsufficientStock { .. } => CommandErrorCode::InsufficientStock,
                OrderError::InvalidAmount => CommandErrorCode::InvalidAmount,
                OrderError::NotFound(_) => CommandErrorCode::NotFound,
                OrderError::TableOccupied(_) => CommandErrorCode::TableOccupied,
                OrderError::InvalidOperation(_) => CommandErrorCode::InvalidOperation,
                OrderError::Storage(_) => CommandErrorCode::InternalError,
            },
            ManagerError::Stock(err) => match err {
                StockError::Insufficient { .. } => CommandErrorCode::InsufficientStock,
                StockError::IngredientNotFound(_) => CommandErrorCode::NotFound,
                StockError::TenantMismatch(_) => CommandErrorCode::TenantMismatch,
                StockError::InvalidQuantity(_)
                | StockError::MissingDirection
                | StockError::InvalidKind(_) => CommandErrorCode::InvalidOperation,
                StockError::Storage(_) => CommandErrorCode::InternalError,
            },
            ManagerError::Catalog(err) => match err {
                CatalogError::NotFound(_) => CommandErrorCode::NotFound,
                CatalogError::TenantMismatch(_) => CommandErrorCode::TenantMismatch,
                CatalogError::InvalidInput(_) => CommandErrorCode::InvalidOperation,
                CatalogError::Storage(_) => CommandErrorCode::InternalError,
            },
            ManagerError::TenantNotFound(_) => CommandErrorCode::NotFound,
            ManagerError::TenantInactive(_) => CommandErrorCode::InvalidOperation,
            ManagerError::TableOccupied(_) => CommandErrorCode::TableOccupied,
        }
    }
}
