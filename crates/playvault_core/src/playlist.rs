use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;
use crate::types::*;

/// Creator name used when nothing better is known.
pub const ANONYMOUS: &str = "Anonymous";

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Validation messages keyed by form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<FieldErrors> for CoreError {
    fn from(errors: FieldErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

// ---------------------------------------------------------------------------
// PlaylistDraft
// ---------------------------------------------------------------------------

/// Contents of the create/edit playlist form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
}

impl PlaylistDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check the form before submitting. All problems are reported at once.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.insert("name", "Playlist name is required");
        }
        if self.videos.is_empty() {
            errors.insert("videos", "Add at least one video to your playlist");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build a new playlist owned by `user_id`. The id is assigned by the
    /// store and left empty here.
    pub fn into_playlist(
        self,
        user_id: &str,
        creator_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Playlist {
        Playlist {
            id: String::new(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            is_hidden: self.is_hidden,
            is_favorite: false,
            view_count: 0,
            user_id: user_id.to_string(),
            creator_name: Some(
                creator_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(ANONYMOUS)
                    .to_string(),
            ),
            videos: self.videos,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the form contents over an existing playlist.
    pub fn apply_to(self, playlist: &Playlist, now: DateTime<Utc>) -> Playlist {
        Playlist {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            is_hidden: self.is_hidden,
            videos: self.videos,
            updated_at: now,
            ..playlist.clone()
        }
    }
}

impl From<&Playlist> for PlaylistDraft {
    fn from(p: &Playlist) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            is_hidden: p.is_hidden,
            videos: p.videos.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// PlaylistPatch
// ---------------------------------------------------------------------------

/// Metadata-only change. Leaves the video list alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_hidden: Option<bool>,
}

impl PlaylistPatch {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.insert("name", "Playlist name is required");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn apply_to(&self, playlist: &Playlist, now: DateTime<Utc>) -> Playlist {
        let mut out = playlist.clone();
        if let Some(name) = &self.name {
            out.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            out.description = description.trim().to_string();
        }
        if let Some(is_hidden) = self.is_hidden {
            out.is_hidden = is_hidden;
        }
        out.updated_at = now;
        out
    }
}
