//! In-process [`DocumentStore`] used by tests and the demo binary.
//!
//! It can simulate the failure modes the sync layer has to cope with: a
//! composite index that is still building and transient read/write errors.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use crate::store::*;

#[derive(Debug)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    index_ready: bool,
    failing_reads: usize,
    failing_writes: usize,
    writes: usize,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                collections: HashMap::new(),
                index_ready: true,
                failing_reads: 0,
                failing_writes: 0,
                writes: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toggle availability of composite (filter + order) indexes.
    pub fn set_index_ready(&self, ready: bool) {
        self.lock().index_ready = ready;
    }

    /// Make the next `n` reads (`get`/`query`) fail.
    pub fn fail_next_reads(&self, n: usize) {
        self.lock().failing_reads = n;
    }

    /// Make the next `n` writes (`add`/`put`/`delete`) fail.
    pub fn fail_next_writes(&self, n: usize) {
        self.lock().failing_writes = n;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Store a document verbatim, bypassing failure injection.
    pub fn insert_raw(&self, collection: &str, id: &str, fields: Fields) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Current body of a document, bypassing failure injection.
    pub fn raw(&self, collection: &str, id: &str) -> Option<Fields> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Inner {
    fn check_read(&mut self) -> StoreResult<()> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(StoreError::Unavailable("simulated read failure".into()));
        }
        Ok(())
    }

    fn check_write(&mut self) -> StoreResult<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        self.writes += 1;
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut inner = self.lock();
        inner.check_read()?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let mut inner = self.lock();
        inner.check_write()?;
        let id = Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        debug!(collection, id = %id, "document added");
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.check_write()?;
        let doc = inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        for (k, v) in fields {
            doc.insert(k, v);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.check_write()?;
        if let Some(c) = inner.collections.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<QueryPage> {
        let mut inner = self.lock();
        inner.check_read()?;
        if query.needs_composite_index() && !inner.index_ready {
            let field = query
                .order_by
                .as_ref()
                .map(|o| o.field.clone())
                .unwrap_or_default();
            return Err(StoreError::IndexNotReady(format!(
                "composite index on {collection}.{field} is building"
            )));
        }

        let mut docs: Vec<Document> = inner
            .collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, fields)| query.filters.iter().all(|f| f.matches(fields)))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        drop(inner);

        let order_field = query.order_by.as_ref().map(|o| o.field.as_str());
        let direction = query
            .order_by
            .as_ref()
            .map_or(Direction::Ascending, |o| o.direction);

        if order_field.is_some() {
            docs.sort_by(|a, b| {
                let ca = a.cursor_for(order_field);
                let cb = b.cursor_for(order_field);
                compare_positions(&ca.sort_value, &ca.id, &cb.sort_value, &cb.id, direction)
            });
        }

        if let Some(after) = &query.start_after {
            docs.retain(|d| {
                let c = d.cursor_for(order_field);
                compare_positions(&c.sort_value, &c.id, &after.sort_value, &after.id, direction)
                    .is_gt()
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        let last_cursor = docs.last().map(|d| d.cursor_for(order_field));
        Ok(QueryPage {
            documents: docs,
            last_cursor,
        })
    }
}
