//! HTTP error responses.
//!
//! Handlers return `Result<_, ApiError>`; anything convertible into
//! [`AppError`] renders as `{"error": <code>, "message": <text>}` with the
//! matching status.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use oplots_core::document::DocumentError;
use oplots_shared::AppError;
use serde_json::json;

/// Wrapper that renders an [`AppError`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        Self(err.into())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let message = err.body_text();
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self(AppError::PayloadTooLarge(message))
        } else {
            Self(AppError::BadRequest(message))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        } else {
            tracing::debug!(error = %err, "Request rejected");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": err.error_code(),
                "message": err.public_message(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use oplots_shared::types::LotId;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_forbidden_keeps_message() {
        let response =
            ApiError::from(DocumentError::forbidden("Can update document only author")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "Can update document only author");
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let response =
            ApiError::from(DocumentError::repository("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "database_error");
        assert_eq!(body["message"], "An error occurred");
    }

    #[rstest]
    #[case(DocumentError::LotNotFound(LotId::new()), StatusCode::NOT_FOUND)]
    #[case(DocumentError::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(DocumentError::Conflict(LotId::new()), StatusCode::CONFLICT)]
    #[case(DocumentError::RogueField("x".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    fn test_status_mapping(#[case] err: DocumentError, #[case] status: StatusCode) {
        assert_eq!(ApiError::from(err).into_response().status(), status);
    }
}
