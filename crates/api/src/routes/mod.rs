//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::optional_auth_middleware};

pub mod health;
pub mod lot_documents;

/// Creates the versioned API router.
///
/// Every route resolves the caller first; permissions are decided per lot
/// by the handlers.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(lot_documents::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
}
