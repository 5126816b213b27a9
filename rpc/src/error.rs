//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dpos_store::StoreError;
use thiserror::Error;

use crate::handlers::MessageResponse;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum RpcError {
    /// The request failed parameter validation. Displays the bare
    /// validation message.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The query string could not be decoded at all.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The account store could not serve the read; the request may be
    /// retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            RpcError::StoreUnavailable(e.to_string())
        } else {
            RpcError::Server(e.to_string())
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = MessageResponse::new(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}
