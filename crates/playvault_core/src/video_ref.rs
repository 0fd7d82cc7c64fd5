//! Video URL recognition and thumbnail derivation.
//!
//! Parsing is pure: a raw URL maps to an 11-character canonical id or to
//! nothing. Thumbnails are a string template over that id, so they can always
//! be recomputed from the URL instead of being stored.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Length of a canonical video id. Captures of any other length are rejected.
pub const VIDEO_ID_LEN: usize = 11;

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";
const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.*(youtu\.be/|/v/|/u/\w/|/embed/|\?v=|&v=)([^#&?]*).*")
            .expect("video id pattern is valid")
    })
}

fn host_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.?be)/.+$")
            .expect("video host pattern is valid")
    })
}

// ---------------------------------------------------------------------------
// ThumbnailSize
// ---------------------------------------------------------------------------

/// Which of the two fixed thumbnail renditions to build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ThumbnailSize {
    /// Full-size frame used in list rows and edit forms.
    #[default]
    List,
    /// Medium-quality frame used by the player popup.
    Player,
}

impl ThumbnailSize {
    fn file_name(self) -> &'static str {
        match self {
            ThumbnailSize::List => "0.jpg",
            ThumbnailSize::Player => "mqdefault.jpg",
        }
    }
}

// ---------------------------------------------------------------------------
// VideoRef
// ---------------------------------------------------------------------------

/// Result of parsing a raw URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoRef {
    pub canonical_id: Option<String>,
}

impl VideoRef {
    pub fn is_valid(&self) -> bool {
        self.canonical_id.is_some()
    }

    pub fn thumbnail_url(&self, size: ThumbnailSize) -> Option<String> {
        self.canonical_id
            .as_deref()
            .map(|id| thumbnail_url(id, size))
    }

    pub fn watch_url(&self) -> Option<String> {
        self.canonical_id.as_deref().map(watch_url)
    }
}

/// Parse a raw URL into a canonical reference.
pub fn parse(raw_url: &str) -> VideoRef {
    VideoRef {
        canonical_id: extract_video_id(raw_url),
    }
}

/// Extract the canonical video id, or `None` when no pattern matches or the
/// captured id is not exactly [`VIDEO_ID_LEN`] characters.
pub fn extract_video_id(raw_url: &str) -> Option<String> {
    let raw_url = raw_url.trim();
    if raw_url.is_empty() {
        return None;
    }
    let captures = id_pattern().captures(raw_url)?;
    let id = captures.get(2)?.as_str();
    if id.chars().count() == VIDEO_ID_LEN {
        Some(id.to_string())
    } else {
        None
    }
}

/// Cheap pre-check applied to URLs typed into the add form.
pub fn looks_like_video_host(raw_url: &str) -> bool {
    host_pattern().is_match(raw_url.trim())
}

pub fn thumbnail_url(video_id: &str, size: ThumbnailSize) -> String {
    format!("{THUMBNAIL_BASE}/{video_id}/{}", size.file_name())
}

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_BASE}{video_id}")
}
