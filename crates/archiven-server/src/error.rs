use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use archiven_core::ArchiveError;
use archiven_core::domain::ReasonCode;

use crate::api::schemas::ErrorResponse;

/// ハンドラが返すエラー。`IntoResponse` で JSON エラー本文に変換する。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("file is required")]
    MissingFile,

    #[error("malformed multipart request: {0}")]
    Multipart(String),

    #[error("failed to build response: {0}")]
    Response(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

fn headline(reason: ReasonCode) -> &'static str {
    match reason {
        ReasonCode::MissingType | ReasonCode::TypeNotAllowed => "file type not allowed",
        ReasonCode::SizeExceeded => "file validation failed",
        ReasonCode::InvalidName => "invalid file name",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingFile => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("file is required"),
            ),
            ApiError::Multipart(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("malformed multipart request").with_details(vec![detail]),
            ),
            ApiError::Archive(ArchiveError::Validation(err)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(headline(err.reason))
                    .with_reason(err.reason)
                    .with_details(vec![err.message]),
            ),
            ApiError::Archive(ArchiveError::NotFound(_) | ArchiveError::InvalidId(_)) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("file not found"),
            ),
            // 内部エラーの詳細はログにのみ残す
            err @ (ApiError::Archive(ArchiveError::Storage { .. }) | ApiError::Response(_)) => {
                error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
