// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::derive_title;

/// Length of the id prefix shown in listings.
pub const SHORT_ID_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Display title, derived from the first line of the content.
    pub fn title(&self) -> String {
        derive_title(&self.content)
    }

    /// First [`SHORT_ID_LEN`] characters of the id, used in listings.
    pub fn short_id(&self) -> String {
        self.id.to_string()[..SHORT_ID_LEN].to_string()
    }
}
