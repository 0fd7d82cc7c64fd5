use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::video_ref::{self, ThumbnailSize};

/// Title given to entries added without one.
pub const UNTITLED_VIDEO: &str = "Untitled Video";

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Trimmed title, or [`UNTITLED_VIDEO`] when blank.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED_VIDEO.to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// VideoEntry
// ---------------------------------------------------------------------------

/// One video in a playlist. Position in the owning list is its identity.
///
/// The thumbnail is not part of the in-memory value; it is derived from `url`
/// on demand and only written out for readers of the stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "VideoEntryDoc", into = "VideoEntryDoc")]
pub struct VideoEntry {
    pub url: String,
    pub title: String,
    pub description: String,
    pub added_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VideoEntry {
    pub fn new(
        url: impl Into<String>,
        title: &str,
        description: &str,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into().trim().to_string(),
            title: normalize_title(title),
            description: description.trim().to_string(),
            added_at,
            updated_at: None,
        }
    }

    /// Build an entry from a search result the user picked.
    pub fn from_candidate(candidate: &CatalogCandidate, added_at: DateTime<Utc>) -> Self {
        Self::new(
            candidate.url.clone(),
            &candidate.title,
            &candidate.description,
            added_at,
        )
    }

    pub fn video_id(&self) -> Option<String> {
        video_ref::extract_video_id(&self.url)
    }

    pub fn thumbnail_url(&self, size: ThumbnailSize) -> Option<String> {
        self.video_id()
            .map(|id| video_ref::thumbnail_url(&id, size))
    }
}

/// Stored shape of a [`VideoEntry`]. Tolerates missing fields from older
/// documents and ignores any cached thumbnail on read.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoEntryDoc {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default = "epoch")]
    added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<VideoEntryDoc> for VideoEntry {
    fn from(doc: VideoEntryDoc) -> Self {
        Self {
            url: doc.url,
            title: normalize_title(&doc.title),
            description: doc.description,
            added_at: doc.added_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<VideoEntry> for VideoEntryDoc {
    fn from(entry: VideoEntry) -> Self {
        let thumbnail_url = entry.thumbnail_url(ThumbnailSize::List);
        Self {
            url: entry.url,
            title: entry.title,
            description: entry.description,
            thumbnail_url,
            added_at: entry.added_at,
            updated_at: entry.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// VideoPatch
// ---------------------------------------------------------------------------

/// Partial update for a single entry. `None` leaves the field untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VideoPatch {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl VideoPatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.title.is_none() && self.description.is_none()
    }
}

// ---------------------------------------------------------------------------
// CatalogCandidate
// ---------------------------------------------------------------------------

/// A video offered by the search provider, not yet part of any playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCandidate {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Playlist
// ---------------------------------------------------------------------------

/// A playlist document. `id` is the document key and is not stored inside
/// the document body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        !self.user_id.is_empty() && self.user_id == user_id
    }

    /// Replace the video list and stamp `updated_at`.
    pub fn with_videos(&self, videos: Vec<VideoEntry>, now: DateTime<Utc>) -> Self {
        Self {
            videos,
            updated_at: now,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
