//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Rejected ==
/// Reasons an object is refused admission into the cache.
///
/// Rejection is never fatal: the caller discards the candidate entry and the
/// client is still served from the origin response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    /// Object is larger than the per-object limit
    #[error("object of {size} bytes exceeds per-object limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Object could never fit, even in an empty cache
    #[error("object of {size} bytes exceeds cache capacity of {capacity} bytes")]
    ExceedsCapacity { size: usize, capacity: usize },

    /// Another worker already admitted the same key
    #[error("key already cached: {0}")]
    AlreadyCached(String),
}

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Payload buffer could not be allocated
    #[error("failed to allocate {size} byte payload")]
    Allocation { size: usize },

    /// Admission refused
    #[error("admission rejected: {0}")]
    Rejected(#[from] Rejected),
}

// == Proxy Error Enum ==
/// Errors raised while relaying a single client connection.
///
/// Each maps to the HTTP status the client sees, when a response can still
/// be written at all.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed request line or URI
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Method other than GET
    #[error("method not implemented: {0}")]
    NotImplemented(String),

    /// Origin server unreachable or misbehaving
    #[error("upstream {host}:{port} failed: {source}")]
    Upstream {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Client socket failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// Status code and reason phrase reported back to the client.
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            ProxyError::BadRequest(_) => (400, "Bad Request"),
            ProxyError::NotImplemented(_) => (501, "Not Implemented"),
            ProxyError::Upstream { .. } => (502, "Bad Gateway"),
            ProxyError::Io(_) => (500, "Internal Server Error"),
        }
    }
}

// == Admin Error Enum ==
/// Errors returned by the admin HTTP API.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
