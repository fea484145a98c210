//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockpile_core::DomainError;
use stockpile_infra::{CatalogServiceError, QueryError, StockLedgerError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn catalog_error_to_response(err: CatalogServiceError) -> axum::response::Response {
    match err {
        CatalogServiceError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "product not found")
        }
        CatalogServiceError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        CatalogServiceError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        CatalogServiceError::Domain(DomainError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        CatalogServiceError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn ledger_error_to_response(err: StockLedgerError) -> axum::response::Response {
    match err {
        StockLedgerError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "product not found")
        }
        StockLedgerError::InvalidQuantity => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_quantity",
            "quantity must be positive",
        ),
        StockLedgerError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn query_error_to_response(err: QueryError) -> axum::response::Response {
    match err {
        QueryError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "product not found")
        }
        QueryError::Index(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "index_error", e.to_string())
        }
    }
}
