use playvault_core::types::Playlist;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identity of the signed-in user, passed explicitly to every call that
/// needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

// ---------------------------------------------------------------------------
// MountHandle
// ---------------------------------------------------------------------------

/// Shared flag telling in-flight requests whether their view still exists.
#[derive(Debug, Clone)]
pub struct MountHandle(Arc<AtomicBool>);

impl MountHandle {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// EditSession
// ---------------------------------------------------------------------------

/// Local state of one playlist editor view.
///
/// Mutations borrow the session mutably for their whole duration, so a second
/// submit cannot start while one is in flight.
#[derive(Debug)]
pub struct EditSession {
    session: Session,
    playlist: Playlist,
    mount: MountHandle,
}

impl EditSession {
    pub fn new(session: Session, playlist: Playlist) -> Self {
        Self {
            session,
            playlist,
            mount: MountHandle::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn is_owner(&self) -> bool {
        self.playlist.is_owned_by(&self.session.user_id)
    }

    /// Handle to give to whatever tears the view down.
    pub fn mount_handle(&self) -> MountHandle {
        self.mount.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    pub(crate) fn replace(&mut self, playlist: Playlist) {
        self.playlist = playlist;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(owner: &str) -> Playlist {
        serde_json::from_value(serde_json::json!({"name": "Mix", "userId": owner})).unwrap()
    }

    #[test]
    fn ownership_follows_session_user() {
        let edit = EditSession::new(Session::new("u1"), playlist("u1"));
        assert!(edit.is_owner());
        let edit = EditSession::new(Session::new("u2"), playlist("u1"));
        assert!(!edit.is_owner());
    }

    #[test]
    fn unmount_is_visible_through_clones() {
        let edit = EditSession::new(Session::new("u1"), playlist("u1"));
        let handle = edit.mount_handle();
        assert!(edit.is_mounted());
        handle.clone().unmount();
        assert!(!edit.is_mounted());
        assert!(!handle.is_mounted());
    }
}
