//! Remote document store interface.
//!
//! The store is a key/value document API grouped into collections. It has no
//! partial-array update, so list edits always rewrite the whole array.

use chrono::{DateTime, Utc};
use playvault_core::types::Playlist;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

use crate::error::{Result, SyncError};

/// Body of a stored document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The ordered/filtered query needs a composite index that is still
    /// being built on the server.
    #[error("index not ready: {0}")]
    IndexNotReady(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Decode as a playlist. Missing fields take their defaults.
    pub fn to_playlist(&self) -> Result<Playlist> {
        let mut playlist: Playlist = serde_json::from_value(Value::Object(self.fields.clone()))?;
        playlist.id = self.id.clone();
        Ok(playlist)
    }

    /// Cursor positioned at this document for the given ordering field.
    pub fn cursor_for(&self, order_field: Option<&str>) -> StoreCursor {
        StoreCursor {
            id: self.id.clone(),
            sort_value: order_field
                .and_then(|f| self.fields.get(f).cloned())
                .unwrap_or(Value::Null),
        }
    }
}

/// Serialize a playlist into document fields (without its id).
pub fn playlist_fields(playlist: &Playlist) -> Result<Fields> {
    match serde_json::to_value(playlist)? {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::Store(format!(
            "playlist serialized to a non-object: {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    /// Documents without the field never match.
    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Store-native position marker: the last document returned, reduced to its
/// id and ordering value.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCursor {
    pub id: String,
    pub sort_value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub start_after: Option<StoreCursor>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn start_after(mut self, cursor: StoreCursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the store needs a composite index to serve this query.
    pub fn needs_composite_index(&self) -> bool {
        self.order_by.is_some() && !self.filters.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub documents: Vec<Document>,
    /// Cursor at the last returned document, `None` for an empty page.
    pub last_cursor: Option<StoreCursor>,
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Remote document store consumed by the reconciler and the pager.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create a document with a store-assigned id.
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Upsert: merge `fields` into the document, creating it if needed.
    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<QueryPage>;
}

// ---------------------------------------------------------------------------
// Ordering helpers
// ---------------------------------------------------------------------------

/// Total order over stored values. RFC 3339 strings compare as instants so
/// differing fractional-second precision does not skew the order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Position of `(value, id)` relative to `(other_value, other_id)` under the
/// given direction. Ties on the value are broken by id.
pub fn compare_positions(
    value: &Value,
    id: &str,
    other_value: &Value,
    other_id: &str,
    direction: Direction,
) -> Ordering {
    let primary = compare_values(value, other_value);
    let primary = match direction {
        Direction::Ascending => primary,
        Direction::Descending => primary.reverse(),
    };
    primary.then_with(|| id.cmp(other_id))
}
