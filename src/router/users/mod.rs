//! Users-related HTTP API.
mod get;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::get;
use axum::{Router, middleware};

use crate::identity::IdentityService;
use crate::{AppState, error::ServerError};

const BEARER: &str = "Bearer ";

/// Custom middleware for authentification.
async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response, ServerError> {
    let token = match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        Some(token) => token.strip_prefix(BEARER).unwrap_or(token).to_owned(),
        None => return Err(ServerError::Unauthenticated),
    };

    let identity = IdentityService::new(
        state.db.postgres.clone(),
        Arc::clone(&state.crypto),
    )
    .identity_for_session(&token)
    .await?
    .ok_or(ServerError::Unauthenticated)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /users/@me` goes to `get`. Authorization required.
        .route("/@me", get(get::handler))
        .route_layer(middleware::from_fn_with_state(state, auth))
}
