//! Domain model and pure editing logic for video playlists.
//!
//! Everything in this crate is synchronous and free of network I/O. The
//! `playvault_sync` crate wraps these operations with persistence.

pub mod drag;
pub mod editing;
pub mod error;
pub mod ops;
pub mod playlist;
pub mod search;
pub mod types;
pub mod video_ref;

pub use error::{CoreError, Result};
pub use ops::ListOp;
pub use types::{Playlist, VideoEntry};
