//! HTTP-level error type.
//!
//! Domain errors convert into [`AppError`], which renders as a JSON
//! body `{"code": ..., "message": ...}` with the matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use shared::order::CommandErrorCode;

use crate::catalog::CatalogError;
use crate::orders::manager::ManagerError;
use crate::orders::traits::OrderError;
use crate::stock::StockError;
use crate::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{1}")]
    Status(StatusCode, String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Status(status, _) => *status,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Status for a wire-level command error code.
pub fn status_for(code: CommandErrorCode) -> StatusCode {
    match code {
        CommandErrorCode::InvalidTransition
        | CommandErrorCode::InsufficientStock
        | CommandErrorCode::TableOccupied => StatusCode::CONFLICT,
        CommandErrorCode::TenantMismatch => StatusCode::FORBIDDEN,
        CommandErrorCode::InvalidAmount | CommandErrorCode::InvalidOperation => {
            StatusCode::BAD_REQUEST
        }
        CommandErrorCode::OrderNotFound | CommandErrorCode::NotFound => StatusCode::NOT_FOUND,
        CommandErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        AppError::Status(status_for(err.code()), err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::from(ManagerError::Order(err))
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        AppError::from(ManagerError::Stock(err))
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::from(ManagerError::Catalog(err))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}
