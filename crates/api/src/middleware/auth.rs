//! Bearer token authentication.
//!
//! Lot documents are readable without credentials, so the middleware never
//! rejects a request that carries no token: the caller is treated as
//! anonymous. A token that is present but invalid is rejected with 401.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use oplots_shared::{JwtError, Principal};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that resolves the caller.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header, if any
/// 2. Validates the token using the JWT service
/// 3. Stores the resulting [`Principal`] in request extensions
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(header) = auth_header else {
        request.extensions_mut().insert(Principal::Anonymous);
        return next.run(request).await;
    };

    let Some(token) = extract_bearer_token(header) else {
        return unauthorized(
            "invalid_token",
            "Authorization header must use the Bearer scheme",
        );
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal::from(&claims));
            next.run(request).await
        }
        Err(JwtError::Expired) => unauthorized("token_expired", "Token has expired"),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            unauthorized("invalid_token", "Invalid or malformed token")
        }
    }
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Extractor for the resolved caller.
///
/// Falls back to [`Principal::Anonymous`] on routes mounted without the
/// middleware.
#[derive(Debug, Clone, Copy)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Principal>()
                .copied()
                .unwrap_or(Principal::Anonymous),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
