mod draft;
mod reconciler;
mod store;

pub use draft::*;
pub use reconciler::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable per-identity profile row as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileRecord {
    /// Identity UUID; at most one row exists per identity.
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileRecord {
    /// Canonical display name: `first_name` + " " + `last_name`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
