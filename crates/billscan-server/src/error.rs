//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use billscan_core::{BillscanError, GenerationError, ModelError, OcrError};

/// Error returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request body is missing a field or malformed.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Core(#[from] BillscanError),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::Core(err) => match err {
                BillscanError::Ocr(OcrError::Decode(_)) => (StatusCode::BAD_REQUEST, "decode"),
                BillscanError::Ocr(OcrError::Disabled) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "ocr_disabled")
                }
                BillscanError::Ocr(OcrError::Timeout(_)) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout")
                }
                BillscanError::Ocr(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ocr_engine"),
                BillscanError::Generation(GenerationError::Timeout(_)) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout")
                }
                BillscanError::Generation(_) => (StatusCode::BAD_GATEWAY, "upstream_generation"),
                BillscanError::Model(ModelError::Inference(_)) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "inference")
                }
                BillscanError::Model(_) => (StatusCode::INTERNAL_SERVER_ERROR, "model"),
                BillscanError::Config(_) | BillscanError::Task(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            },
        }
    }
}

impl From<OcrError> for ApiError {
    fn from(err: OcrError) -> Self {
        ApiError::Core(err.into())
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::Core(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(kind, "Request failed: {}", self);
        } else {
            warn!(kind, "Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": kind,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status(ApiError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(OcrError::Decode("bad".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(OcrError::Disabled.into()), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(OcrError::Engine("x".into()).into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(OcrError::Timeout(30).into()), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status(GenerationError::Connect("refused".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(GenerationError::Timeout(120).into()),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status(ApiError::Core(BillscanError::Task("panicked".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
