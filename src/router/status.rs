//! Public configuration page and database diagnostic.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;
use crate::config::Configuration;
use crate::error::{Result, ServerError};

/// Structured configuration.
#[derive(Serialize)]
pub struct Status {
    version: String,
    name: String,
    favicon: Option<String>,
}

/// Public server status (configuration).
pub async fn status(State(config): State<Arc<Configuration>>) -> Json<Status> {
    Json(Status {
        version: env!("CARGO_PKG_VERSION").into(),
        name: if config.name.is_empty() {
            env!("CARGO_CRATE_NAME").into()
        } else {
            config.name.clone()
        },
        favicon: config.favicon.clone(),
    })
}

#[derive(Serialize)]
pub struct Health {
    database: &'static str,
}

/// Check that the database answers a trivial read.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>> {
    state.db.ping().await.map_err(|err| {
        tracing::warn!(error = %err, "database unreachable");
        ServerError::StoreUnavailable
    })?;

    Ok(Json(Health {
        database: "reachable",
    }))
}
