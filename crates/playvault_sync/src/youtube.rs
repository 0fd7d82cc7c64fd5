//! Catalog search provider backed by the YouTube Data API v3.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use playvault_core::types::CatalogCandidate;
use playvault_core::video_ref;

use crate::config::ClientConfig;
use crate::error::{Result, SyncError};

/// Source of candidate videos offered to the playlist editor.
#[allow(async_fn_in_trait)]
pub trait VideoSearch: Send + Sync {
    /// Up to `max_results` videos matching `keyword`. A blank keyword yields
    /// no results without a request.
    async fn lookup(&self, keyword: &str, max_results: usize) -> Result<Vec<CatalogCandidate>>;

    async fn video_details(&self, video_id: &str) -> Result<CatalogCandidate>;
}

pub struct YouTubeDataApi {
    http: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeDataApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config
            .youtube_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SyncError::Config("no YouTube API key configured".into()))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.youtube_api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(url = %url, "YouTube API request");

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(SyncError::Search(api_error_message(&body).unwrap_or_else(|| {
                format!("YouTube API returned {}", status.as_u16())
            })))
        }
    }
}

impl VideoSearch for YouTubeDataApi {
    async fn lookup(&self, keyword: &str, max_results: usize) -> Result<Vec<CatalogCandidate>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        let max = max_results.to_string();
        let body = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("maxResults", max.as_str()),
                    ("q", keyword),
                ],
            )
            .await?;
        let candidates = parse_search_response(&body)?;
        debug!(keyword, results = candidates.len(), "YouTube search");
        Ok(candidates)
    }

    async fn video_details(&self, video_id: &str) -> Result<CatalogCandidate> {
        let body = self
            .get_json("videos", &[("part", "snippet"), ("id", video_id)])
            .await?;
        parse_videos_response(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound {
                entity: "Video",
                id: video_id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ListResponse<I> {
    #[serde(default = "Vec::new")]
    items: Vec<Item<I>>,
}

#[derive(Deserialize)]
struct Item<I> {
    id: I,
    #[serde(default)]
    snippet: Snippet,
}

/// `search` returns `{"kind": ..., "videoId": ...}` as the item id.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub fn parse_search_response(body: &str) -> Result<Vec<CatalogCandidate>> {
    let response: ListResponse<SearchId> = serde_json::from_str(body)?;
    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            Some(candidate(id, item.snippet))
        })
        .collect())
}

pub fn parse_videos_response(body: &str) -> Result<Vec<CatalogCandidate>> {
    let response: ListResponse<String> = serde_json::from_str(body)?;
    Ok(response
        .items
        .into_iter()
        .map(|item| candidate(item.id, item.snippet))
        .collect())
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|r| r.error.message)
        .filter(|m| !m.is_empty())
}

fn candidate(id: String, snippet: Snippet) -> CatalogCandidate {
    CatalogCandidate {
        url: video_ref::watch_url(&id),
        id,
        title: snippet.title,
        description: snippet.description,
        thumbnail_url: snippet.thumbnails.medium.map(|t| t.url),
        channel_title: snippet.channel_title,
        published_at: snippet.published_at,
    }
}
