use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::identity::IdentityService;
use crate::router::Valid;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
}

/// Handler to login to an account.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let service = IdentityService::new(
        state.db.postgres.clone(),
        Arc::clone(&state.crypto),
    );

    let identity = service
        .authenticate(&body.email.to_lowercase(), &body.password)
        .await?;
    let token = service.open_session(&identity).await?;

    tracing::info!(identity_id = %identity.id, "session opened");

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token,
    }))
}
