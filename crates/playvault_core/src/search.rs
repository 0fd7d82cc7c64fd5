//! Case-insensitive substring matching over playlist name and description.

use crate::types::Playlist;

/// True when `term` occurs in the playlist's name or description, ignoring
/// case. Video metadata is not searched. A blank term matches everything.
pub fn matches_term(playlist: &Playlist, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    playlist.name.to_lowercase().contains(&needle)
        || playlist.description.to_lowercase().contains(&needle)
}

/// Matching playlists in their original order.
pub fn filter_by_term<'a>(
    playlists: impl IntoIterator<Item = &'a Playlist>,
    term: &str,
) -> Vec<Playlist> {
    playlists
        .into_iter()
        .filter(|p| matches_term(p, term))
        .cloned()
        .collect()
}
