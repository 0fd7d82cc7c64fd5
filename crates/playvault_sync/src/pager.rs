//! Newest-first browsing of the public catalog, with a degraded path for
//! when the store's composite index is still being built.

use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use playvault_core::search;
use playvault_core::types::Playlist;

use crate::config::ClientConfig;
use crate::error::{Result, SyncError};
use crate::store::{
    compare_positions, Direction, Document, DocumentStore, Fields, Query, StoreCursor, StoreError,
};

const ORDER_FIELD: &str = "createdAt";
const HIDDEN_FIELD: &str = "isHidden";

/// Position after which the next page starts.
#[derive(Debug, Clone, PartialEq)]
pub enum PageCursor {
    /// Returned by the store's ordered query.
    Native(StoreCursor),
    /// Id of the last item of a page built without the index.
    ById(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Playlist>,
    pub cursor: Option<PageCursor>,
    pub has_more: bool,
    /// The page came from the degraded path. A short page here does not
    /// prove the catalog is exhausted.
    pub index_building: bool,
}

impl Page {
    fn end() -> Self {
        Self::default()
    }
}

/// A further page exists only if this one was full and produced a cursor.
pub fn has_more(len: usize, page_size: usize, cursor: Option<&PageCursor>) -> bool {
    page_size > 0 && len == page_size && cursor.is_some()
}

/// Where search reads the catalog from.
#[derive(Debug, Clone, Copy)]
pub enum SearchSource<'a> {
    /// Items the caller already holds.
    Snapshot(&'a [Playlist]),
    /// Read the whole catalog from the store.
    FetchAll,
}

pub struct CatalogPager<S> {
    store: Arc<S>,
    collection: String,
    visibility_defaulted: AtomicBool,
}

impl<S: DocumentStore> CatalogPager<S> {
    pub fn new(store: Arc<S>, config: &ClientConfig) -> Self {
        Self {
            store,
            collection: config.playlists_collection.clone(),
            visibility_defaulted: AtomicBool::new(false),
        }
    }

    pub async fn fetch_first_page(&self, page_size: usize) -> Result<Page> {
        if page_size == 0 {
            return Ok(Page::end());
        }
        self.default_visibility_flags().await?;
        let query = listing_query(page_size);
        match self.store.query(&self.collection, &query).await {
            Ok(page) => native_page(&page.documents, page.last_cursor, page_size),
            Err(StoreError::IndexNotReady(reason)) => {
                warn!(%reason, page_size, "ordered listing unavailable, sorting in memory");
                self.fallback_first_page(page_size).await
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn fetch_next_page(
        &self,
        cursor: Option<&PageCursor>,
        page_size: usize,
    ) -> Result<Page> {
        if page_size == 0 {
            return Ok(Page::end());
        }
        if cursor.is_none() {
            return Ok(Page::end());
        }
        self.default_visibility_flags().await?;
        match cursor {
            None => Ok(Page::end()),
            Some(PageCursor::Native(after)) => self.page_after(after.clone(), page_size).await,
            Some(PageCursor::ById(id)) => {
                let Some(doc) = self.store.get(&self.collection, id).await? else {
                    warn!(cursor_id = %id, "cursor document is gone, ending pagination");
                    return Ok(Page::end());
                };
                self.page_after(doc.cursor_for(Some(ORDER_FIELD)), page_size)
                    .await
            }
        }
    }

    /// Case-insensitive substring match on name and description over every
    /// visible playlist. Not paginated.
    pub async fn search(&self, term: &str, source: SearchSource<'_>) -> Result<Vec<Playlist>> {
        let results = match source {
            SearchSource::Snapshot(items) => {
                search::filter_by_term(items.iter().filter(|p| !p.is_hidden), term)
            }
            SearchSource::FetchAll => {
                let page = self.store.query(&self.collection, &Query::new()).await?;
                let mut docs: Vec<Document> =
                    page.documents.into_iter().filter(is_visible).collect();
                docs.sort_by(newest_first);
                let playlists = decode_all(&docs)?;
                search::filter_by_term(&playlists, term)
            }
        };
        debug!(term, matches = results.len(), "catalog search");
        Ok(results)
    }

    /// The filtered listing cannot match documents that lack `isHidden`,
    /// while every in-memory path treats them as visible. Write the default
    /// into such documents once per pager. A failed write is retried on the
    /// next page request.
    async fn default_visibility_flags(&self) -> Result<()> {
        if self.visibility_defaulted.load(atomic::Ordering::Acquire) {
            return Ok(());
        }
        let page = self.store.query(&self.collection, &Query::new()).await?;
        let mut updated = 0;
        let mut complete = true;
        for doc in page
            .documents
            .iter()
            .filter(|d| !matches!(d.get(HIDDEN_FIELD), Some(Value::Bool(_))))
        {
            let mut fields = Fields::new();
            fields.insert(HIDDEN_FIELD.into(), Value::Bool(false));
            match self.store.put(&self.collection, &doc.id, fields).await {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(playlist_id = %doc.id, error = %e, "could not default visibility flag");
                    complete = false;
                }
            }
        }
        if updated > 0 {
            info!(updated, "defaulted missing visibility flags");
        }
        if complete {
            self.visibility_defaulted
                .store(true, atomic::Ordering::Release);
        }
        Ok(())
    }

    async fn page_after(&self, after: StoreCursor, page_size: usize) -> Result<Page> {
        let query = listing_query(page_size).start_after(after.clone());
        match self.store.query(&self.collection, &query).await {
            Ok(page) => native_page(&page.documents, page.last_cursor, page_size),
            Err(StoreError::IndexNotReady(reason)) => {
                warn!(%reason, page_size, "ordered listing unavailable, scanning after cursor");
                self.scan_after(&after, page_size).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fallback_first_page(&self, page_size: usize) -> Result<Page> {
        let sample = Query::new().limit(page_size.saturating_mul(2));
        let page = self.store.query(&self.collection, &sample).await?;
        let mut docs: Vec<Document> = page.documents.into_iter().filter(is_visible).collect();
        docs.sort_by(newest_first);
        docs.truncate(page_size);
        degraded_page(docs, page_size)
    }

    async fn scan_after(&self, after: &StoreCursor, page_size: usize) -> Result<Page> {
        let page = self.store.query(&self.collection, &Query::new()).await?;
        let mut docs: Vec<Document> = page
            .documents
            .into_iter()
            .filter(is_visible)
            .filter(|d| {
                let c = d.cursor_for(Some(ORDER_FIELD));
                compare_positions(
                    &c.sort_value,
                    &c.id,
                    &after.sort_value,
                    &after.id,
                    Direction::Descending,
                )
                .is_gt()
            })
            .collect();
        docs.sort_by(newest_first);
        docs.truncate(page_size);
        degraded_page(docs, page_size)
    }
}

fn listing_query(page_size: usize) -> Query {
    Query::new()
        .filter_eq(HIDDEN_FIELD, false)
        .order_by(ORDER_FIELD, Direction::Descending)
        .limit(page_size)
}

fn native_page(
    docs: &[Document],
    last_cursor: Option<StoreCursor>,
    page_size: usize,
) -> Result<Page> {
    let items = decode_all(docs)?;
    let cursor = last_cursor.map(PageCursor::Native);
    Ok(Page {
        has_more: has_more(items.len(), page_size, cursor.as_ref()),
        items,
        cursor,
        index_building: false,
    })
}

fn degraded_page(docs: Vec<Document>, page_size: usize) -> Result<Page> {
    let items = decode_all(&docs)?;
    let cursor = docs.last().map(|d| PageCursor::ById(d.id.clone()));
    Ok(Page {
        has_more: has_more(items.len(), page_size, cursor.as_ref()),
        items,
        cursor,
        index_building: true,
    })
}

fn decode_all(docs: &[Document]) -> Result<Vec<Playlist>> {
    docs.iter().map(Document::to_playlist).collect()
}

// Documents without the flag predate it and count as visible.
fn is_visible(doc: &Document) -> bool {
    doc.get(HIDDEN_FIELD) != Some(&Value::Bool(true))
}

fn newest_first(a: &Document, b: &Document) -> Ordering {
    let ca = a.cursor_for(Some(ORDER_FIELD));
    let cb = b.cursor_for(Some(ORDER_FIELD));
    compare_positions(&ca.sort_value, &ca.id, &cb.sort_value, &cb.id, Direction::Descending)
}

// ---------------------------------------------------------------------------
// CatalogBrowser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    Page,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    Loading(BrowseMode),
    Loaded,
    Errored(String),
}

/// One browsing session over the catalog: paged listing plus a search mode
/// that shares the same result area.
///
/// Entering search freezes paging. Clearing the term resumes from the pages
/// and cursor already loaded.
pub struct CatalogBrowser<S> {
    pager: CatalogPager<S>,
    page_size: usize,
    state: PagerState,
    items: Vec<Playlist>,
    cursor: Option<PageCursor>,
    has_more: bool,
    index_building: bool,
    term: Option<String>,
    search_results: Vec<Playlist>,
}

impl<S: DocumentStore> CatalogBrowser<S> {
    pub fn new(pager: CatalogPager<S>, page_size: usize) -> Self {
        Self {
            pager,
            page_size,
            state: PagerState::Idle,
            items: Vec::new(),
            cursor: None,
            has_more: false,
            index_building: false,
            term: None,
            search_results: Vec::new(),
        }
    }

    pub fn state(&self) -> &PagerState {
        &self.state
    }

    pub fn mode(&self) -> BrowseMode {
        if self.term.is_some() {
            BrowseMode::Search
        } else {
            BrowseMode::Page
        }
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    /// Every item loaded through paging so far.
    pub fn items(&self) -> &[Playlist] {
        &self.items
    }

    /// Full-catalog matches for the active term.
    pub fn search_results(&self) -> &[Playlist] {
        &self.search_results
    }

    /// Loaded items to show in the paged list. With a term active, only the
    /// loaded items matching it.
    pub fn visible(&self) -> Vec<&Playlist> {
        match &self.term {
            Some(term) => self
                .items
                .iter()
                .filter(|p| search::matches_term(p, term))
                .collect(),
            None => self.items.iter().collect(),
        }
    }

    /// Whether another page can be requested. While the sort index is
    /// building a short page does not mean the end, so paging continues as
    /// long as there is a cursor.
    pub fn has_more(&self) -> bool {
        self.mode() == BrowseMode::Page
            && (self.has_more || (self.index_building && self.cursor.is_some()))
    }

    pub fn is_index_building(&self) -> bool {
        self.index_building
    }

    /// Reset and load the first page.
    pub async fn load_first(&mut self) -> Result<()> {
        self.state = PagerState::Loading(BrowseMode::Page);
        let result = self.pager.fetch_first_page(self.page_size).await;
        match result {
            Ok(page) => {
                self.items.clear();
                self.absorb(page);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Append the next page. Does nothing in search mode or at the end.
    pub async fn load_more(&mut self) -> Result<()> {
        if !self.has_more() {
            return Ok(());
        }
        self.state = PagerState::Loading(BrowseMode::Page);
        let result = self
            .pager
            .fetch_next_page(self.cursor.as_ref(), self.page_size)
            .await;
        match result {
            Ok(page) => {
                self.absorb(page);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Enter search mode for `term`. A blank term leaves search mode.
    pub async fn search(&mut self, term: &str) -> Result<()> {
        let term = term.trim();
        if term.is_empty() {
            self.clear_search();
            return Ok(());
        }
        self.state = PagerState::Loading(BrowseMode::Search);
        self.term = Some(term.to_string());
        match self.pager.search(term, SearchSource::FetchAll).await {
            Ok(results) => {
                self.search_results = results;
                self.state = PagerState::Loaded;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn clear_search(&mut self) {
        self.term = None;
        self.search_results.clear();
        if self.state != PagerState::Idle {
            self.state = PagerState::Loaded;
        }
    }

    fn absorb(&mut self, page: Page) {
        debug!(
            items = page.items.len(),
            has_more = page.has_more,
            index_building = page.index_building,
            "page loaded"
        );
        self.items.extend(page.items);
        self.cursor = page.cursor;
        self.has_more = page.has_more;
        self.index_building = page.index_building;
        self.state = PagerState::Loaded;
    }

    fn fail(&mut self, err: SyncError) -> SyncError {
        warn!(error = %err, "catalog request failed");
        self.state = PagerState::Errored(err.to_string());
        err
    }
}
