use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::identity::IdentityService;

const BEARER: &str = "Bearer ";

/// Handler to revoke the current session. Revoking an already-revoked
/// session is a no-op.
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ServerError::Unauthenticated)?;
    let token = token.strip_prefix(BEARER).unwrap_or(token);

    IdentityService::new(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .close_session(token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
