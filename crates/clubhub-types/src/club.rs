//! Club records handled by the club directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for creating a club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClub {
    pub name: String,
    pub description: String,
    pub category: String,
    pub city: Option<String>,
    /// User who asked for the club to be created.
    pub owner_id: String,
}

/// A club stored in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub city: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Club {
    /// Relative web link to the club page.
    pub fn link(&self) -> String {
        format!("/clubs/{}/", self.id)
    }
}

/// Filter for club searches. Empty fields match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    5
}

impl Default for ClubQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            city: None,
            limit: default_limit(),
        }
    }
}
