//! Persistence and catalog browsing for playvault playlists.
//!
//! The [`reconciler`] keeps an editor's local playlist convergent with the
//! stored document, the [`pager`] lists the public catalog newest-first, and
//! [`youtube`] supplies candidate videos. All of them talk to storage through
//! the [`store::DocumentStore`] trait.

pub mod config;
pub mod error;
pub mod memory;
pub mod pager;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod youtube;

pub use config::ClientConfig;
pub use error::{ErrorKind, Recovery, Result, SyncError, SyncFailure, SyncResult};
pub use memory::MemoryStore;
pub use pager::{CatalogBrowser, CatalogPager, Page, PageCursor};
pub use reconciler::PlaylistReconciler;
pub use session::{EditSession, Session};
pub use store::DocumentStore;
pub use youtube::{VideoSearch, YouTubeDataApi};
