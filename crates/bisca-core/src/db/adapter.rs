// Storage adapter trait: the seam between the schema and a concrete store.
//
// Adapters work on raw `bson::Document`s; the typed `Store` layer converts
// records on top. Filters are plain equality documents whose keys may be
// dotted paths (`rules.max_players`, `players.player_id`).

use std::fmt;

use async_trait::async_trait;
use bson::Document;
use serde::{Deserialize, Serialize};

use crate::db::schema::DatabaseSchema;
use crate::error::BiscaError;

/// Result type for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, BiscaError>;

// ─── Sort / Find Many ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification (field + direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Query parameters for `find_many`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyQuery {
    pub filter: Document,
    pub sort_by: Option<SortBy>,
    pub limit: Option<i64>,
}

impl FindManyQuery {
    pub fn filter(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ─── Schema Bootstrap ────────────────────────────────────────────

/// Options for `create_schema`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Skip collections that already exist instead of failing.
    /// Their indexes are still ensured.
    #[serde(default)]
    pub if_not_exists: bool,
}

/// What a `create_schema` run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStatus {
    /// Collections created with their validator.
    pub created: Vec<String>,
    /// Collections that already existed.
    pub skipped: Vec<String>,
    /// Number of indexes ensured across all collections.
    pub indexes: usize,
}

// ─── Adapter Trait ───────────────────────────────────────────────

/// The storage adapter trait.
///
/// Implemented by the in-memory store and the MongoDB store. Every write is
/// checked against the collection's validator and unique indexes; a
/// rejected write leaves the store unchanged.
#[async_trait]
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Create every collection with its validator, then its indexes.
    ///
    /// Fails with `CollectionExists` on the first existing collection unless
    /// `options.if_not_exists` is set.
    async fn create_schema(
        &self,
        schema: &DatabaseSchema,
        options: &SchemaOptions,
    ) -> AdapterResult<SchemaStatus>;

    /// Names of the collections that currently exist.
    async fn list_collections(&self) -> AdapterResult<Vec<String>>;

    /// Insert one document.
    async fn insert_one(&self, collection: &str, doc: Document) -> AdapterResult<()>;

    /// Find the first document matching `filter`.
    async fn find_one(&self, collection: &str, filter: Document)
        -> AdapterResult<Option<Document>>;

    async fn find_many(&self, collection: &str, query: FindManyQuery)
        -> AdapterResult<Vec<Document>>;

    async fn count(&self, collection: &str, filter: Document) -> AdapterResult<u64>;

    /// Apply `set` to the first document matching `filter`.
    /// Returns whether a document matched.
    async fn update_one(&self, collection: &str, filter: Document, set: Document)
        -> AdapterResult<bool>;

    /// Replace the first document matching `filter` with `doc`, keeping its
    /// `_id`. Fields absent from `doc` are gone afterwards.
    /// Returns whether a document matched.
    async fn replace_one(&self, collection: &str, filter: Document, doc: Document)
        -> AdapterResult<bool>;

    /// Delete every document matching `filter`. Returns the number removed.
    async fn delete_many(&self, collection: &str, filter: Document) -> AdapterResult<u64>;

    /// Drop a collection with its validator and indexes. Missing is not an error.
    async fn drop_collection(&self, collection: &str) -> AdapterResult<()>;
}
