//! Music documents

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry, stored as one JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: Uuid,
    /// Uploader's user id; a reference only, the user service owns users
    pub artist_id: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub poster_url: String,
    pub title: String,
    #[serde(default)]
    pub short_desc: String,
}

impl Music {
    /// A freshly uploaded entry: no likes, no poster
    pub fn new(artist_id: impl Into<String>, title: String, short_desc: String, file_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            artist_id: artist_id.into(),
            likes: 0,
            file_url,
            poster_url: String::new(),
            title,
            short_desc,
        }
    }

    /// Apply a metadata patch; absent fields are left as they are
    pub fn apply_metadata(&mut self, changes: &MetadataChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(short_desc) = &changes.short_desc {
            self.short_desc = short_desc.clone();
        }
    }
}

/// Like or unlike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Like,
    Unlike,
}

impl LikeChange {
    /// Signed step applied to the counter
    pub fn delta(self) -> i64 {
        match self {
            LikeChange::Like => 1,
            LikeChange::Unlike => -1,
        }
    }

    /// New counter value; unlike at zero stays at zero
    pub fn apply(self, likes: u64) -> u64 {
        match self {
            LikeChange::Like => likes.saturating_add(1),
            LikeChange::Unlike => likes.saturating_sub(1),
        }
    }
}

/// Partial update of title and description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataChanges {
    pub title: Option<String>,
    pub short_desc: Option<String>,
}

impl MetadataChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.short_desc.is_none()
    }
}
