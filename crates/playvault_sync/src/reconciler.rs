//! Keeps a locally edited playlist and its stored document convergent.
//!
//! List edits are applied to local state first and then persisted by writing
//! the entire `videos` array. If the write fails the stored document is read
//! back and replaces local state; there is no undo log.

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use playvault_core::drag::{self, DragEvent};
use playvault_core::editing;
use playvault_core::ops::ListOp;
use playvault_core::playlist::{PlaylistDraft, PlaylistPatch, ANONYMOUS};
use playvault_core::types::{Playlist, VideoEntry};

use crate::config::ClientConfig;
use crate::error::{Recovery, Result, SyncError, SyncFailure, SyncResult};
use crate::session::{EditSession, Session};
use crate::store::{playlist_fields, DocumentStore, Fields, Query};

/// A video persisted ahead of further edits, with its position in the
/// re-read playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedVideo {
    pub playlist: Playlist,
    pub index: usize,
}

pub struct PlaylistReconciler<S> {
    store: Arc<S>,
    collection: String,
    users_collection: String,
}

impl<S: DocumentStore> PlaylistReconciler<S> {
    pub fn new(store: Arc<S>, config: &ClientConfig) -> Self {
        Self {
            store,
            collection: config.playlists_collection.clone(),
            users_collection: config.users_collection.clone(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Read the authoritative playlist.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let doc = self
            .store
            .get(&self.collection, playlist_id)
            .await?
            .ok_or_else(|| SyncError::playlist_not_found(playlist_id))?;
        doc.to_playlist()
    }

    /// Open an editor on a playlist the session owns.
    pub async fn open_for_edit(&self, session: &Session, playlist_id: &str) -> Result<EditSession> {
        let playlist = self.get_playlist(playlist_id).await?;
        ensure_owner(session, &playlist)?;
        Ok(EditSession::new(session.clone(), playlist))
    }

    /// Playlists owned by `user_id`, newest first. Uses an owner-only filter so
    /// no composite index is needed; ordering happens in memory.
    pub async fn list_user_playlists(&self, user_id: &str) -> Result<Vec<Playlist>> {
        let query = Query::new().filter_eq("userId", user_id);
        let page = self.store.query(&self.collection, &query).await?;
        let mut playlists = page
            .documents
            .iter()
            .map(|d| d.to_playlist())
            .collect::<Result<Vec<_>>>()?;
        playlists.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(playlists)
    }

    /// Current display name of the playlist's owner. Falls back to the name
    /// stored on the playlist, then to "Anonymous".
    pub async fn resolve_creator_name(&self, playlist: &Playlist) -> String {
        let fallback = playlist
            .creator_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string());
        if playlist.user_id.is_empty() {
            return fallback;
        }
        match self.store.get(&self.users_collection, &playlist.user_id).await {
            Ok(Some(doc)) => doc
                .get("username")
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(fallback),
            Ok(None) => fallback,
            Err(e) => {
                warn!(user_id = %playlist.user_id, error = %e, "creator lookup failed");
                fallback
            }
        }
    }

    // -----------------------------------------------------------------------
    // Playlist lifecycle
    // -----------------------------------------------------------------------

    pub async fn create_playlist(&self, session: &Session, draft: PlaylistDraft) -> Result<Playlist> {
        draft
            .validate()
            .map_err(|e| SyncError::Validation(e.to_string()))?;
        let mut playlist =
            draft.into_playlist(&session.user_id, session.display_name.as_deref(), Utc::now());
        let id = self
            .store
            .add(&self.collection, playlist_fields(&playlist)?)
            .await
            .map_err(|e| SyncError::RemoteWrite(e.to_string()))?;
        playlist.id = id;
        info!(playlist_id = %playlist.id, videos = playlist.videos.len(), "playlist created");
        Ok(playlist)
    }

    /// Save the whole edit form: metadata and video list.
    pub async fn update_playlist(
        &self,
        session: &Session,
        playlist_id: &str,
        draft: PlaylistDraft,
    ) -> Result<Playlist> {
        draft
            .validate()
            .map_err(|e| SyncError::Validation(e.to_string()))?;
        let current = self.get_playlist(playlist_id).await?;
        ensure_owner(session, &current)?;
        let updated = draft.apply_to(&current, Utc::now());
        self.write(playlist_id, playlist_fields(&updated)?).await?;
        Ok(updated)
    }

    /// Change name, description or visibility without touching the videos.
    pub async fn update_metadata(
        &self,
        session: &Session,
        playlist_id: &str,
        patch: &PlaylistPatch,
    ) -> Result<Playlist> {
        patch
            .validate()
            .map_err(|e| SyncError::Validation(e.to_string()))?;
        let current = self.get_playlist(playlist_id).await?;
        ensure_owner(session, &current)?;
        let updated = patch.apply_to(&current, Utc::now());

        let mut fields = Fields::new();
        fields.insert("name".into(), json!(updated.name));
        fields.insert("description".into(), json!(updated.description));
        fields.insert("isHidden".into(), json!(updated.is_hidden));
        fields.insert("updatedAt".into(), serde_json::to_value(updated.updated_at)?);
        self.write(playlist_id, fields).await?;
        Ok(updated)
    }

    pub async fn delete_playlist(&self, session: &Session, playlist_id: &str) -> Result<()> {
        let current = self.get_playlist(playlist_id).await?;
        ensure_owner(session, &current)?;
        self.store
            .delete(&self.collection, playlist_id)
            .await
            .map_err(|e| SyncError::RemoteWrite(e.to_string()))?;
        info!(playlist_id, "playlist deleted");
        Ok(())
    }

    /// Favorite flag is writable by any viewer and only touches that field.
    /// The playlist must already exist.
    pub async fn set_favorite(&self, playlist_id: &str, is_favorite: bool) -> Result<()> {
        if self.store.get(&self.collection, playlist_id).await?.is_none() {
            return Err(SyncError::playlist_not_found(playlist_id));
        }
        let mut fields = Fields::new();
        fields.insert("isFavorite".into(), json!(is_favorite));
        self.write(playlist_id, fields).await
    }

    /// Read-then-write increment. Concurrent viewers can lose increments;
    /// the count is an approximate popularity signal.
    pub async fn update_view_count(&self, playlist_id: &str) -> Result<u64> {
        let current = self.get_playlist(playlist_id).await?;
        let count = current.view_count.saturating_add(1);
        let mut fields = Fields::new();
        fields.insert("viewCount".into(), json!(count));
        self.write(playlist_id, fields).await?;
        debug!(playlist_id, count, "view count updated");
        Ok(count)
    }

    /// Write explicit defaults into documents created before `viewCount` and
    /// `isHidden` existed. Returns how many documents were updated.
    pub async fn backfill_missing_defaults(&self) -> Result<usize> {
        let page = self.store.query(&self.collection, &Query::new()).await?;
        let mut updated = 0;
        for doc in &page.documents {
            let mut fields = Fields::new();
            if !matches!(doc.get("viewCount"), Some(Value::Number(_))) {
                fields.insert("viewCount".into(), json!(0));
            }
            if !matches!(doc.get("isHidden"), Some(Value::Bool(_))) {
                fields.insert("isHidden".into(), json!(false));
            }
            if fields.is_empty() {
                continue;
            }
            self.write(&doc.id, fields).await?;
            updated += 1;
        }
        if updated > 0 {
            info!(updated, "backfilled playlist defaults");
        }
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Video list edits
    // -----------------------------------------------------------------------

    /// Apply `op` to the editor's list optimistically, then persist the whole
    /// resulting array.
    ///
    /// Removals and edits first re-read the stored list so the index refers to
    /// the entry the user sees in the freshest order. On a failed write the
    /// stored playlist is re-read and replaces local state.
    pub async fn apply_and_persist(
        &self,
        edit: &mut EditSession,
        op: ListOp,
    ) -> SyncResult<Playlist> {
        if !edit.is_owner() {
            return Err(SyncFailure::unchanged(SyncError::Forbidden(
                "only the owner can edit this playlist".into(),
            )));
        }
        if op.is_noop() {
            return Ok(edit.playlist().clone());
        }
        let playlist_id = edit.playlist().id.clone();

        let mut refreshed = false;
        if op.targets_existing_index() {
            let latest = self
                .get_playlist(&playlist_id)
                .await
                .map_err(SyncFailure::unchanged)?;
            if !edit.is_mounted() {
                return Err(SyncFailure::discarded());
            }
            refreshed = edit.playlist() != &latest;
            edit.replace(latest);
        }

        let now = Utc::now();
        let videos = match op.apply(&edit.playlist().videos, now) {
            Ok(videos) => videos,
            // Local state already holds the re-read list; report it so the
            // caller re-renders.
            Err(e) if refreshed => {
                return Err(SyncFailure {
                    error: e.into(),
                    recovery: Recovery::RolledBack(edit.playlist().clone()),
                })
            }
            Err(e) => return Err(SyncFailure::unchanged(e)),
        };
        let optimistic = edit.playlist().with_videos(videos, now);
        edit.replace(optimistic.clone());
        debug!(
            playlist_id = %playlist_id,
            op = op.description(),
            videos = optimistic.videos.len(),
            "applied optimistically"
        );

        match self.write_videos(&playlist_id, &optimistic).await {
            Ok(()) if edit.is_mounted() => Ok(optimistic),
            Ok(()) => Err(SyncFailure::discarded()),
            Err(write_err) => {
                error!(playlist_id = %playlist_id, error = %write_err, "persist failed, rolling back");
                Err(self.roll_back(edit, &playlist_id, write_err).await)
            }
        }
    }

    /// Map a drag gesture onto a move and persist it. Returns `None` when the
    /// gesture does not describe a move.
    pub async fn apply_drag(
        &self,
        edit: &mut EditSession,
        event: &DragEvent,
    ) -> Option<SyncResult<Playlist>> {
        let op = drag::resolve_move(event, edit.playlist().videos.len())?;
        Some(self.apply_and_persist(edit, op).await)
    }

    /// Persist a new video before any further edit: read the stored list,
    /// append, write back, then re-read so the caller gets the new entry's
    /// index in the stored order.
    pub async fn add_video_remote_first(
        &self,
        session: &Session,
        playlist_id: &str,
        mut entry: VideoEntry,
    ) -> Result<AddedVideo> {
        let current = self.get_playlist(playlist_id).await?;
        ensure_owner(session, &current)?;

        let now = Utc::now();
        entry.added_at = now;
        let videos = editing::add_selected(&current.videos, entry)?;
        let appended = current.with_videos(videos, now);
        self.write_videos(playlist_id, &appended).await?;

        let playlist = self.get_playlist(playlist_id).await?;
        let index = playlist.videos.len().checked_sub(1).ok_or_else(|| {
            SyncError::Store(format!("playlist {playlist_id} has no videos after append"))
        })?;
        Ok(AddedVideo { playlist, index })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn roll_back(
        &self,
        edit: &mut EditSession,
        playlist_id: &str,
        write_err: SyncError,
    ) -> SyncFailure {
        let recovery = match self.get_playlist(playlist_id).await {
            Ok(authoritative) => {
                if !edit.is_mounted() {
                    return SyncFailure::discarded();
                }
                edit.replace(authoritative.clone());
                Recovery::RolledBack(authoritative)
            }
            Err(e) => {
                warn!(playlist_id, error = %e, "refetch after failed write also failed");
                Recovery::RefetchFailed(e.to_string())
            }
        };
        SyncFailure {
            error: write_err,
            recovery,
        }
    }

    async fn write_videos(&self, playlist_id: &str, playlist: &Playlist) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert("videos".into(), serde_json::to_value(&playlist.videos)?);
        fields.insert("updatedAt".into(), serde_json::to_value(playlist.updated_at)?);
        self.write(playlist_id, fields).await
    }

    async fn write(&self, playlist_id: &str, fields: Fields) -> Result<()> {
        self.store
            .put(&self.collection, playlist_id, fields)
            .await
            .map_err(|e| SyncError::RemoteWrite(e.to_string()))
    }
}

fn ensure_owner(session: &Session, playlist: &Playlist) -> Result<()> {
    if playlist.is_owned_by(&session.user_id) {
        Ok(())
    } else {
        Err(SyncError::Forbidden(format!(
            "playlist {} belongs to another user",
            playlist.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use playvault_core::types::VideoPatch;

    const RICK: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn url(n: usize) -> String {
        format!("https://www.youtube.com/watch?v={n:0>11}")
    }

    fn entry(n: usize) -> VideoEntry {
        VideoEntry::new(url(n), &format!("Video {n}"), "", Utc::now())
    }

    fn reconciler() -> PlaylistReconciler<MemoryStore> {
        PlaylistReconciler::new(Arc::new(MemoryStore::new()), &ClientConfig::default())
    }

    fn owner() -> Session {
        Session::new("u1").with_display_name("dj")
    }

    async fn seeded(r: &PlaylistReconciler<MemoryStore>, videos: usize) -> Playlist {
        let mut draft = PlaylistDraft::new("Road Trip Mix");
        draft.videos = (0..videos).map(entry).collect();
        r.create_playlist(&owner(), draft).await.unwrap()
    }

    fn titles(p: &Playlist) -> Vec<&str> {
        p.videos.iter().map(|v| v.title.as_str()).collect()
    }

    #[tokio::test]
    async fn create_assigns_owner_and_defaults() {
        let r = reconciler();
        let created = seeded(&r, 1).await;
        assert!(!created.id.is_empty());

        let stored = r.get_playlist(&created.id).await.unwrap();
        assert_eq!(stored.user_id, "u1");
        assert_eq!(stored.creator_name.as_deref(), Some("dj"));
        assert_eq!(stored.view_count, 0);
        assert!(!stored.is_favorite);
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft() {
        let r = reconciler();
        let err = r
            .create_playlist(&owner(), PlaylistDraft::new("  "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(r.store().is_empty("playlists"));
    }

    #[tokio::test]
    async fn missing_playlist_is_not_found() {
        let r = reconciler();
        let err = r.get_playlist("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn add_writes_full_list() {
        let r = reconciler();
        let p = seeded(&r, 2).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();

        let op = ListOp::Add {
            entry: VideoEntry::new(RICK, "Rick", "", Utc::now()),
        };
        let saved = r.apply_and_persist(&mut edit, op).await.unwrap();
        assert_eq!(titles(&saved), vec!["Video 0", "Video 1", "Rick"]);
        assert_eq!(edit.playlist(), &saved);

        let stored = r.get_playlist(&p.id).await.unwrap();
        assert_eq!(stored.videos, saved.videos);
        assert_eq!(stored.updated_at, saved.updated_at);
    }

    #[tokio::test]
    async fn failed_write_rolls_back_to_stored_state() {
        let r = reconciler();
        let p = seeded(&r, 3).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();

        r.store().fail_next_writes(1);
        let failure = r
            .apply_and_persist(&mut edit, ListOp::MoveDown { index: 0 })
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), ErrorKind::RemoteWrite);
        let rolled = failure.rolled_back_to().unwrap();
        assert_eq!(titles(rolled), vec!["Video 0", "Video 1", "Video 2"]);
        assert_eq!(edit.playlist(), rolled);
    }

    #[tokio::test]
    async fn failed_refetch_is_reported() {
        let r = reconciler();
        let p = seeded(&r, 2).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();

        r.store().fail_next_writes(1);
        r.store().fail_next_reads(1);
        let failure = r
            .apply_and_persist(&mut edit, ListOp::MoveUp { index: 1 })
            .await
            .unwrap_err();
        assert!(matches!(failure.recovery, Recovery::RefetchFailed(_)));
    }

    #[tokio::test]
    async fn remove_uses_freshest_stored_order() {
        let r = reconciler();
        let p = seeded(&r, 3).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();

        // Another tab moved the last video to the front.
        let mut other = r.open_for_edit(&owner(), &p.id).await.unwrap();
        r.apply_and_persist(&mut other, ListOp::MoveTo { from: 2, to: 0 })
            .await
            .unwrap();

        let saved = r
            .apply_and_persist(&mut edit, ListOp::Remove { index: 0 })
            .await
            .unwrap();
        assert_eq!(titles(&saved), vec!["Video 0", "Video 1"]);
    }

    #[tokio::test]
    async fn edit_out_of_range_leaves_state_unchanged() {
        let r = reconciler();
        let p = seeded(&r, 1).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();
        let writes = r.store().write_count();

        let op = ListOp::Edit {
            index: 5,
            patch: VideoPatch {
                title: Some("x".into()),
                ..Default::default()
            },
        };
        let failure = r.apply_and_persist(&mut edit, op).await.unwrap_err();
        assert_eq!(failure.kind(), ErrorKind::Validation);
        assert_eq!(failure.recovery, Recovery::Unchanged);
        assert_eq!(titles(edit.playlist()), vec!["Video 0"]);
        assert_eq!(r.store().write_count(), writes);
    }

    #[tokio::test]
    async fn stale_index_reports_refetched_list() {
        let r = reconciler();
        let p = seeded(&r, 3).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();

        let mut other = r.open_for_edit(&owner(), &p.id).await.unwrap();
        r.apply_and_persist(&mut other, ListOp::Remove { index: 2 })
            .await
            .unwrap();

        let op = ListOp::Edit {
            index: 2,
            patch: VideoPatch {
                title: Some("gone".into()),
                ..Default::default()
            },
        };
        let failure = r.apply_and_persist(&mut edit, op).await.unwrap_err();
        assert_eq!(failure.kind(), ErrorKind::Validation);
        let restored = failure.rolled_back_to().unwrap();
        assert_eq!(titles(restored), vec!["Video 0", "Video 1"]);
        assert_eq!(edit.playlist(), restored);
    }

    #[tokio::test]
    async fn favorite_on_missing_playlist_is_not_found() {
        let r = reconciler();
        let err = r.set_favorite("ghost", true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(r.store().raw("playlists", "ghost").is_none());
        assert!(r.store().is_empty("playlists"));
    }

    #[tokio::test]
    async fn non_owner_cannot_edit() {
        let r = reconciler();
        let p = seeded(&r, 1).await;
        assert!(matches!(
            r.open_for_edit(&Session::new("u2"), &p.id).await,
            Err(SyncError::Forbidden(_))
        ));

        let mut edit = EditSession::new(Session::new("u2"), p.clone());
        let failure = r
            .apply_and_persist(&mut edit, ListOp::Remove { index: 0 })
            .await
            .unwrap_err();
        assert!(matches!(failure.error, SyncError::Forbidden(_)));
        assert_eq!(r.get_playlist(&p.id).await.unwrap().videos.len(), 1);
    }

    #[tokio::test]
    async fn result_after_unmount_is_discarded() {
        let r = reconciler();
        let p = seeded(&r, 1).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();
        edit.mount_handle().unmount();

        let failure = r
            .apply_and_persist(&mut edit, ListOp::Add { entry: entry(7) })
            .await
            .unwrap_err();
        assert_eq!(failure.recovery, Recovery::Discarded);
    }

    #[tokio::test]
    async fn drag_moves_and_persists() {
        let r = reconciler();
        let p = seeded(&r, 3).await;
        let mut edit = r.open_for_edit(&owner(), &p.id).await.unwrap();

        let saved = r
            .apply_drag(&mut edit, &DragEvent::new("video-0", Some("video-2")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(titles(&saved), vec!["Video 1", "Video 2", "Video 0"]);

        let writes = r.store().write_count();
        assert!(r
            .apply_drag(&mut edit, &DragEvent::new("video-1", Some("video-1")))
            .await
            .is_none());
        assert!(r
            .apply_drag(&mut edit, &DragEvent::new("video-0", Some("video-9")))
            .await
            .is_none());
        assert_eq!(r.store().write_count(), writes);
    }

    #[tokio::test]
    async fn remote_first_add_reports_new_index() {
        let r = reconciler();
        let p = seeded(&r, 2).await;
        let added = r
            .add_video_remote_first(&owner(), &p.id, VideoEntry::new(RICK, "Rick", "", Utc::now()))
            .await
            .unwrap();
        assert_eq!(added.index, 2);
        assert_eq!(added.playlist.videos[added.index].url, RICK);

        let err = r
            .add_video_remote_first(
                &owner(),
                &p.id,
                VideoEntry::new("https://youtu.be/short", "x", "", Utc::now()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn view_count_increments() {
        let r = reconciler();
        let p = seeded(&r, 1).await;
        assert_eq!(r.update_view_count(&p.id).await.unwrap(), 1);
        assert_eq!(r.update_view_count(&p.id).await.unwrap(), 2);
        assert_eq!(r.get_playlist(&p.id).await.unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn metadata_and_favorite_leave_videos_alone() {
        let r = reconciler();
        let p = seeded(&r, 2).await;
        let patch = PlaylistPatch {
            name: Some("Night Drive".into()),
            is_hidden: Some(true),
            ..Default::default()
        };
        r.update_metadata(&owner(), &p.id, &patch).await.unwrap();
        r.set_favorite(&p.id, true).await.unwrap();

        let stored = r.get_playlist(&p.id).await.unwrap();
        assert_eq!(stored.name, "Night Drive");
        assert!(stored.is_hidden);
        assert!(stored.is_favorite);
        assert_eq!(stored.videos, p.videos);
    }

    #[tokio::test]
    async fn full_form_save_replaces_metadata_and_videos() {
        let r = reconciler();
        let p = seeded(&r, 2).await;
        let mut draft = PlaylistDraft::from(&p);
        draft.name = "Renamed".into();
        draft.videos.truncate(1);
        let saved = r.update_playlist(&owner(), &p.id, draft).await.unwrap();
        assert_eq!(saved.name, "Renamed");
        assert_eq!(r.get_playlist(&p.id).await.unwrap().videos.len(), 1);
    }

    #[tokio::test]
    async fn delete_requires_owner() {
        let r = reconciler();
        let p = seeded(&r, 1).await;
        assert!(r.delete_playlist(&Session::new("u2"), &p.id).await.is_err());
        r.delete_playlist(&owner(), &p.id).await.unwrap();
        assert_eq!(r.get_playlist(&p.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn user_playlists_newest_first() {
        let r = reconciler();
        let store = r.store();
        for (id, user, ts) in [
            ("a", "u1", "2024-01-01T00:00:00Z"),
            ("b", "u2", "2024-01-05T00:00:00Z"),
            ("c", "u1", "2024-01-03T00:00:00Z"),
        ] {
            let fields = serde_json::json!({"name": id, "userId": user, "createdAt": ts});
            store.insert_raw("playlists", id, fields.as_object().cloned().unwrap());
        }
        let mine = r.list_user_playlists("u1").await.unwrap();
        let ids: Vec<_> = mine.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn backfill_writes_only_missing_defaults() {
        let r = reconciler();
        let store = r.store();
        let legacy = serde_json::json!({"name": "old"});
        store.insert_raw("playlists", "old", legacy.as_object().cloned().unwrap());
        seeded(&r, 1).await;

        assert_eq!(r.backfill_missing_defaults().await.unwrap(), 1);
        let raw = store.raw("playlists", "old").unwrap();
        assert_eq!(raw.get("viewCount"), Some(&serde_json::json!(0)));
        assert_eq!(raw.get("isHidden"), Some(&serde_json::json!(false)));
        assert_eq!(r.backfill_missing_defaults().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn creator_name_prefers_user_profile() {
        let r = reconciler();
        let p = seeded(&r, 1).await;
        assert_eq!(r.resolve_creator_name(&p).await, "dj");

        let profile = serde_json::json!({"username": "DJ Rust"});
        r.store()
            .insert_raw("users", "u1", profile.as_object().cloned().unwrap());
        assert_eq!(r.resolve_creator_name(&p).await, "DJ Rust");

        let orphan = Playlist {
            user_id: String::new(),
            creator_name: None,
            ..p
        };
        assert_eq!(r.resolve_creator_name(&orphan).await, ANONYMOUS);
    }
}
