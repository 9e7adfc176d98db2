use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::identity::{Identity, IdentityService};
use crate::profile::{DraftStore, PendingProfileDraft};
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 60,
        message = "First name must not be empty."
    ))]
    pub first_name: String,
    #[validate(length(
        min = 1,
        max = 60,
        message = "Last name must not be empty."
    ))]
    pub last_name: String,
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
    pub id: Uuid,
}

/// Handler to create an identity.
///
/// The profile row itself is created later by reconciliation; sign-up only
/// records the identity and parks the name fields as a pending draft. No
/// session is opened.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let identity = Identity {
        id: Uuid::new_v4(),
        email: body.email.to_lowercase(),
        first_name: Some(body.first_name.clone()),
        last_name: Some(body.last_name.clone()),
        password: String::default(),
        created_at: Utc::now(),
    };

    let service = IdentityService::new(
        state.db.postgres.clone(),
        Arc::clone(&state.crypto),
    );
    let identity = service.register(identity, &body.password).await?;

    state
        .drafts
        .put(
            identity.id,
            PendingProfileDraft {
                first_name: body.first_name,
                last_name: body.last_name,
            },
        )
        .await;

    tracing::info!(identity_id = %identity.id, "identity created");

    Ok((StatusCode::CREATED, Json(Response { id: identity.id })))
}
