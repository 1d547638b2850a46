//! Per-request identity context.
//!
//! The upstream gateway authenticates the caller and injects identity
//! headers; this extractor turns them into a typed context. The core
//! never trusts a tenant id from the request body.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::utils::AppError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const OPERATOR_ID_HEADER: &str = "x-operator-id";
pub const OPERATOR_NAME_HEADER: &str = "x-operator-name";

/// The acting tenant and operator for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: i64,
    pub operator_id: String,
    pub operator_name: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| {
                AppError::bad_request("missing or invalid X-Tenant-Id header")
            })?;

        let operator_id = parts
            .headers
            .get(OPERATOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::bad_request("missing X-Operator-Id header"))?
            .to_string();

        let operator_name = parts
            .headers
            .get(OPERATOR_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .unwrap_or_else(|| operator_id.clone());

        Ok(Self {
            tenant_id,
            operator_id,
            operator_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<RequestContext, AppError> {
        let (mut parts, _) = request.into_parts();
        RequestContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_full_header_set() {
        let request = Request::builder()
            .header("X-Tenant-Id", "42")
            .header("X-Operator-Id", "op-7")
            .header("X-Operator-Name", "Ana")
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.tenant_id, 42);
        assert_eq!(ctx.operator_id, "op-7");
        assert_eq!(ctx.operator_name, "Ana");
    }

    #[tokio::test]
    async fn test_operator_name_falls_back_to_id() {
        let request = Request::builder()
            .header("X-Tenant-Id", "42")
            .header("X-Operator-Id", "op-7")
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.operator_name, "op-7");
    }

    #[tokio::test]
    async fn test_missing_tenant_rejected() {
        let request = Request::builder()
            .header("X-Operator-Id", "op-7")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_err());

        let request = Request::builder()
            .header("X-Tenant-Id", "not-a-number")
            .header("X-Operator-Id", "op-7")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_err());
    }
}
