//! Error to HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use memoria_error::{MemoriaError, MemoriaErrorKind, StorageErrorKind};
use serde_json::json;
use tracing::{error, warn};

/// A [`MemoriaError`] on its way out of a handler.
#[derive(Debug, derive_more::Display)]
#[display("{}", _0)]
pub struct ApiError(pub MemoriaError);

impl ApiError {
    /// Status code the error is reported with.
    ///
    /// Bad input maps to 400, missing keys to 404, a refused or unreachable
    /// restyling service to 502, everything else to 500.
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            MemoriaErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            MemoriaErrorKind::Storage(e) => match e.kind {
                StorageErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                StorageErrorKind::InvalidKey(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            MemoriaErrorKind::Remote(_) => StatusCode::BAD_GATEWAY,
            MemoriaErrorKind::Restyle(_)
            | MemoriaErrorKind::Config(_)
            | MemoriaErrorKind::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<T> From<T> for ApiError
where
    T: Into<MemoriaError>,
{
    fn from(err: T) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_error::{ConfigError, StorageError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (ValidationError::new("empty").into(), StatusCode::BAD_REQUEST),
            (
                StorageError::new(StorageErrorKind::NotFound("k".into())).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                StorageError::new(StorageErrorKind::FileWrite("disk full".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ConfigError::new("bad").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }
}
