//! Mapping drag-and-drop gestures onto list moves.
//!
//! Sortable items are keyed `video-{index}`. The keys are positional and must
//! be regenerated from the current list on every render.

use tracing::warn;

use crate::ops::ListOp;

const ID_PREFIX: &str = "video-";

/// A finished drag gesture as reported by the sortable list widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEvent {
    pub active_id: String,
    /// `None` when the item was dropped outside any target.
    pub over_id: Option<String>,
}

impl DragEvent {
    pub fn new(active_id: impl Into<String>, over_id: Option<impl Into<String>>) -> Self {
        Self {
            active_id: active_id.into(),
            over_id: over_id.map(Into::into),
        }
    }
}

/// Sortable key for the entry at `index`.
pub fn sortable_id(index: usize) -> String {
    format!("{ID_PREFIX}{index}")
}

/// Sortable keys for a list of `len` entries, in display order.
pub fn sortable_ids(len: usize) -> Vec<String> {
    (0..len).map(sortable_id).collect()
}

/// Recover the position encoded in a sortable key.
pub fn parse_sortable_id(id: &str) -> Option<usize> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

/// Translate a drag gesture into a move for a list of `len` entries.
///
/// Returns `None` when nothing should happen: the item was dropped on itself,
/// dropped outside the list, or either key no longer resolves to a position.
/// Unresolvable keys are logged rather than reported as errors.
pub fn resolve_move(event: &DragEvent, len: usize) -> Option<ListOp> {
    let over_id = event.over_id.as_deref()?;
    if event.active_id == over_id {
        return None;
    }

    let from = resolve_index(&event.active_id, len)?;
    let to = resolve_index(over_id, len)?;
    if from == to {
        return None;
    }
    Some(ListOp::MoveTo { from, to })
}

fn resolve_index(id: &str, len: usize) -> Option<usize> {
    match parse_sortable_id(id) {
        Some(index) if index < len => Some(index),
        Some(index) => {
            warn!(id, index, len, "drag target is past the end of the list");
            None
        }
        None => {
            warn!(id, "unrecognised drag item id");
            None
        }
    }
}
