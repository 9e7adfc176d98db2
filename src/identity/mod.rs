mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::PendingProfileDraft;

/// Authenticated user handle as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Name metadata captured at sign-up, if any.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(skip)]
    pub password: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Identity {
    /// Profile draft carried by this identity's own metadata.
    ///
    /// Usable only when both name fields are present and non-empty.
    pub fn profile_draft(&self) -> Option<PendingProfileDraft> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(PendingProfileDraft {
                    first_name: first.to_owned(),
                    last_name: last.to_owned(),
                })
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(first: Option<&str>, last: Option<&str>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "ann@x.com".into(),
            first_name: first.map(Into::into),
            last_name: last.map(Into::into),
            password: String::default(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_metadata_draft_requires_both_names() {
        assert!(identity(Some("Ann"), Some("Lee")).profile_draft().is_some());
        assert!(identity(Some("Ann"), None).profile_draft().is_none());
        assert!(identity(None, Some("Lee")).profile_draft().is_none());
        assert!(identity(Some(""), Some("Lee")).profile_draft().is_none());
        assert!(identity(None, None).profile_draft().is_none());
    }
}
