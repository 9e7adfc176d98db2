//! Current-user profile, reconciled on read.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::identity::Identity;
use crate::profile::{PgProfileStore, Reconciler};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Ensure the authenticated identity has a profile record and return it.
pub async fn handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Response>> {
    let profiles = PgProfileStore::new(state.db.postgres.clone());
    let display_name = Reconciler::new(&profiles, state.drafts.as_ref())
        .reconcile(&identity)
        .await?;

    Ok(Json(Response {
        id: identity.id,
        email: identity.email,
        display_name,
    }))
}
