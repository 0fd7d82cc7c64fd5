use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::editing;
use crate::error::Result;
use crate::types::*;

/// A single edit to a playlist's video list, kept as a value so it can be
/// applied locally and then replayed against the stored list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ListOp {
    /// Entry typed into the URL form.
    Add { entry: VideoEntry },
    /// Entry picked from catalog search results.
    AddSelected { entry: VideoEntry },
    Remove { index: usize },
    MoveUp { index: usize },
    MoveDown { index: usize },
    MoveTo { from: usize, to: usize },
    Edit { index: usize, patch: VideoPatch },
}

impl ListOp {
    /// Compute the list that results from applying this operation.
    pub fn apply(&self, list: &[VideoEntry], now: DateTime<Utc>) -> Result<Vec<VideoEntry>> {
        match self {
            ListOp::Add { entry } => editing::add(list, entry.clone()),
            ListOp::AddSelected { entry } => editing::add_selected(list, entry.clone()),
            ListOp::Remove { index } => editing::remove_at(list, *index),
            ListOp::MoveUp { index } => editing::move_up(list, *index),
            ListOp::MoveDown { index } => editing::move_down(list, *index),
            ListOp::MoveTo { from, to } => editing::move_to(list, *from, *to),
            ListOp::Edit { index, patch } => editing::edit_at(list, *index, patch, now),
        }
    }

    /// Operations that address an existing entry by position and so must be
    /// computed against the freshest stored list.
    pub fn targets_existing_index(&self) -> bool {
        matches!(self, ListOp::Remove { .. } | ListOp::Edit { .. })
    }

    /// True when applying the operation cannot change the list.
    pub fn is_noop(&self) -> bool {
        matches!(self, ListOp::MoveTo { from, to } if from == to)
    }

    pub fn description(&self) -> &str {
        match self {
            ListOp::Add { .. } | ListOp::AddSelected { .. } => "Add video",
            ListOp::Remove { .. } => "Remove video",
            ListOp::MoveUp { .. } => "Move video up",
            ListOp::MoveDown { .. } => "Move video down",
            ListOp::MoveTo { .. } => "Reorder video",
            ListOp::Edit { .. } => "Edit video",
        }
    }
}
