//! Copy-on-write operations over an ordered list of video entries.
//!
//! Every function takes the current list by reference and returns a new
//! `Vec`; the input is never modified, and a failing call produces no partial
//! result.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::types::*;
use crate::video_ref;

/// Message shown next to the URL field when a URL is rejected.
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid YouTube URL";

/// Validate a URL typed into the add-video form: the host pre-check and the
/// strict id check must both pass.
pub fn validate_form_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(CoreError::validation("Video URL is required"));
    }
    if !video_ref::looks_like_video_host(url) {
        return Err(CoreError::validation(INVALID_URL_MESSAGE));
    }
    validate_strict_url(url)
}

/// Validate a URL against the strict 11-character id check only.
pub fn validate_strict_url(url: &str) -> Result<()> {
    if video_ref::extract_video_id(url).is_none() {
        return Err(CoreError::validation(INVALID_URL_MESSAGE));
    }
    Ok(())
}

/// Append an entry entered through the URL form.
pub fn add(list: &[VideoEntry], entry: VideoEntry) -> Result<Vec<VideoEntry>> {
    validate_form_url(&entry.url)?;
    Ok(append(list, entry))
}

/// Append an entry picked from search results. Skips the host pre-check.
pub fn add_selected(list: &[VideoEntry], entry: VideoEntry) -> Result<Vec<VideoEntry>> {
    validate_strict_url(&entry.url)?;
    Ok(append(list, entry))
}

/// Remove the entry at `index`.
pub fn remove_at(list: &[VideoEntry], index: usize) -> Result<Vec<VideoEntry>> {
    check_index(list, index)?;
    let mut out = list.to_vec();
    out.remove(index);
    Ok(out)
}

/// Swap the entry with its predecessor. No-op at the top of the list.
pub fn move_up(list: &[VideoEntry], index: usize) -> Result<Vec<VideoEntry>> {
    check_index(list, index)?;
    let mut out = list.to_vec();
    if index > 0 {
        out.swap(index, index - 1);
    }
    Ok(out)
}

/// Swap the entry with its successor. No-op at the bottom of the list.
pub fn move_down(list: &[VideoEntry], index: usize) -> Result<Vec<VideoEntry>> {
    check_index(list, index)?;
    let mut out = list.to_vec();
    if index + 1 < out.len() {
        out.swap(index, index + 1);
    }
    Ok(out)
}

/// Take the entry at `from` out and reinsert it at `to`, shifting the
/// entries in between. `from == to` returns an unchanged copy for any index.
pub fn move_to(list: &[VideoEntry], from: usize, to: usize) -> Result<Vec<VideoEntry>> {
    if from == to {
        return Ok(list.to_vec());
    }
    check_index(list, from)?;
    check_index(list, to)?;
    let mut out = list.to_vec();
    let entry = out.remove(from);
    out.insert(to, entry);
    Ok(out)
}

/// Merge `patch` into the entry at `index`, keeping `added_at` and stamping
/// `updated_at`.
pub fn edit_at(
    list: &[VideoEntry],
    index: usize,
    patch: &VideoPatch,
    now: DateTime<Utc>,
) -> Result<Vec<VideoEntry>> {
    check_index(list, index)?;
    if let Some(url) = &patch.url {
        validate_strict_url(url)?;
    }

    let mut out = list.to_vec();
    let entry = &mut out[index];
    if let Some(url) = &patch.url {
        entry.url = url.trim().to_string();
    }
    if let Some(title) = &patch.title {
        entry.title = normalize_title(title);
    }
    if let Some(description) = &patch.description {
        entry.description = description.trim().to_string();
    }
    entry.updated_at = Some(now);
    Ok(out)
}

/// Index of the video to play after `current`, if any.
pub fn next_index(current: usize, len: usize) -> Option<usize> {
    let next = current.checked_add(1)?;
    (next < len).then_some(next)
}

fn append(list: &[VideoEntry], entry: VideoEntry) -> Vec<VideoEntry> {
    let mut out = Vec::with_capacity(list.len() + 1);
    out.extend_from_slice(list);
    out.push(entry);
    out
}

fn check_index(list: &[VideoEntry], index: usize) -> Result<()> {
    if index >= list.len() {
        return Err(CoreError::Index {
            index,
            len: list.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry(n: usize) -> VideoEntry {
        let id = format!("vid{:08}", n);
        VideoEntry::new(
            format!("https://www.youtube.com/watch?v={id}"),
            &format!("Video {n}"),
            "",
            at(n as i64),
        )
    }

    fn make_list(len: usize) -> Vec<VideoEntry> {
        (0..len).map(entry).collect()
    }

    fn titles(list: &[VideoEntry]) -> Vec<&str> {
        list.iter().map(|e| e.title.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // add
    // -----------------------------------------------------------------------

    #[test]
    fn add_appends_at_end_without_touching_input() {
        let list = make_list(2);
        let out = add(&list, entry(9)).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(titles(&out), vec!["Video 0", "Video 1", "Video 9"]);
    }

    #[test]
    fn add_then_remove_last_is_identity() {
        for len in 0..5 {
            let list = make_list(len);
            let out = remove_at(&add(&list, entry(42)).unwrap(), list.len()).unwrap();
            assert_eq!(out, list);
        }
    }

    #[test]
    fn add_rejects_unknown_host() {
        let mut e = entry(1);
        e.url = "https://example.com/video".to_string();
        let err = add(&[], e).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn add_rejects_known_host_with_bad_id() {
        let mut e = entry(1);
        e.url = "https://www.youtube.com/watch?v=short".to_string();
        assert!(add(&[], e).is_err());
    }

    #[test]
    fn add_rejects_empty_url() {
        let mut e = entry(1);
        e.url = String::new();
        assert!(matches!(add(&[], e), Err(CoreError::Validation(_))));
    }

    #[test]
    fn add_selected_skips_host_precheck_but_not_id_check() {
        let mut e = entry(1);
        e.url = "https://m.youtube-nocookie.com/embed/dQw4w9WgXcQ".to_string();
        assert!(add(&[], e.clone()).is_err());
        assert_eq!(add_selected(&[], e).unwrap().len(), 1);

        let mut bad = entry(2);
        bad.url = "https://example.com/video".to_string();
        assert!(add_selected(&[], bad).is_err());
    }

    // -----------------------------------------------------------------------
    // remove_at
    // -----------------------------------------------------------------------

    #[test]
    fn remove_at_middle() {
        let out = remove_at(&make_list(3), 1).unwrap();
        assert_eq!(titles(&out), vec!["Video 0", "Video 2"]);
    }

    #[test]
    fn remove_at_out_of_range_fails() {
        let err = remove_at(&make_list(3), 3).unwrap_err();
        assert!(matches!(err, CoreError::Index { index: 3, len: 3 }));
        assert!(remove_at(&[], 0).is_err());
    }

    // -----------------------------------------------------------------------
    // move_up / move_down
    // -----------------------------------------------------------------------

    #[test]
    fn move_up_then_down_restores_order() {
        let list = make_list(5);
        for i in 1..4 {
            let up = move_up(&list, i).unwrap();
            assert_ne!(up, list);
            let back = move_down(&up, i - 1).unwrap();
            assert_eq!(back, list);

            let down = move_down(&list, i).unwrap();
            assert_eq!(move_up(&down, i + 1).unwrap(), list);
        }
    }

    #[test]
    fn moves_at_boundaries_are_noops() {
        let list = make_list(4);
        assert_eq!(move_up(&list, 0).unwrap(), list);
        assert_eq!(move_down(&list, 3).unwrap(), list);
    }

    #[test]
    fn moves_past_end_fail() {
        let list = make_list(2);
        assert!(move_up(&list, 2).is_err());
        assert!(move_down(&list, 5).is_err());
    }

    // -----------------------------------------------------------------------
    // move_to
    // -----------------------------------------------------------------------

    #[test]
    fn move_to_same_index_is_identity() {
        let list = make_list(4);
        for i in 0..4 {
            assert_eq!(move_to(&list, i, i).unwrap(), list);
        }
    }

    #[test]
    fn move_to_same_index_past_end_is_noop() {
        assert!(move_to(&[], 0, 0).unwrap().is_empty());
        let list = make_list(2);
        assert_eq!(move_to(&list, 5, 5).unwrap(), list);
    }

    #[test]
    fn move_to_shifts_intermediate_entries() {
        let list = make_list(4);
        let forward = move_to(&list, 0, 2).unwrap();
        assert_eq!(titles(&forward), vec!["Video 1", "Video 2", "Video 0", "Video 3"]);

        let backward = move_to(&list, 3, 1).unwrap();
        assert_eq!(titles(&backward), vec!["Video 0", "Video 3", "Video 1", "Video 2"]);
    }

    #[test]
    fn move_to_out_of_range_fails() {
        let list = make_list(3);
        assert!(move_to(&list, 3, 0).is_err());
        assert!(move_to(&list, 0, 3).is_err());
    }

    // -----------------------------------------------------------------------
    // edit_at
    // -----------------------------------------------------------------------

    #[test]
    fn edit_at_merges_and_stamps() {
        let list = make_list(2);
        let patch = VideoPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let out = edit_at(&list, 1, &patch, at(500)).unwrap();
        assert_eq!(out[1].title, "Renamed");
        assert_eq!(out[1].url, list[1].url);
        assert_eq!(out[1].added_at, list[1].added_at);
        assert_eq!(out[1].updated_at, Some(at(500)));
        assert_eq!(out[0], list[0]);
    }

    #[test]
    fn edit_at_changes_url_and_thumbnail_follows() {
        let list = make_list(1);
        let patch = VideoPatch {
            url: Some("https://youtu.be/dQw4w9WgXcQ".to_string()),
            ..Default::default()
        };
        let out = edit_at(&list, 0, &patch, at(1)).unwrap();
        assert_eq!(out[0].video_id().as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn edit_at_out_of_range_leaves_list_unchanged() {
        let list = make_list(2);
        let before = list.clone();
        let patch = VideoPatch {
            title: Some("x".to_string()),
            ..Default::default()
        };
        let err = edit_at(&list, 2, &patch, at(1)).unwrap_err();
        assert!(matches!(err, CoreError::Index { index: 2, len: 2 }));
        assert_eq!(list, before);
    }

    #[test]
    fn edit_at_rejects_bad_url() {
        let list = make_list(1);
        let patch = VideoPatch {
            url: Some("https://example.com/video".to_string()),
            title: Some("ignored".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            edit_at(&list, 0, &patch, at(1)),
            Err(CoreError::Validation(_))
        ));
    }

    // -----------------------------------------------------------------------
    // next_index
    // -----------------------------------------------------------------------

    #[test]
    fn next_index_stops_at_end() {
        assert_eq!(next_index(0, 3), Some(1));
        assert_eq!(next_index(2, 3), None);
        assert_eq!(next_index(0, 0), None);
    }
}
