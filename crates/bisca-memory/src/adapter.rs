// In-memory adapter: a HashMap of collections, each holding its schema and
// documents, implementing the core Adapter trait.
//
// Validators and unique indexes are enforced the way MongoDB enforces them,
// so the schema can be exercised without a database. All writes go through
// one `tokio::sync::RwLock` write guard: the validator check, the uniqueness
// check and the store happen atomically.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use bisca_core::db::adapter::{
    Adapter, AdapterResult, FindManyQuery, SchemaOptions, SchemaStatus, SortDirection,
};
use bisca_core::db::path::{compare_at, index_keys, matches_filter, set_path, values_equal};
use bisca_core::db::schema::{CollectionSchema, DatabaseSchema, IndexSpec};
use bisca_core::error::BiscaError;

/// One collection: its validator and indexes plus its documents.
#[derive(Debug, Clone)]
struct Collection {
    schema: CollectionSchema,
    documents: Vec<Document>,
}

impl Collection {
    fn new(schema: CollectionSchema) -> Self {
        Self {
            schema,
            documents: Vec::new(),
        }
    }

    /// Reject `doc` if it breaks the validator or collides on a unique index
    /// with any stored document other than the one at `skip`.
    fn admit(&self, doc: &Document, skip: Option<usize>) -> AdapterResult<()> {
        self.schema.check(doc)?;

        let id_index = IndexSpec::asc("_id").unique();
        let unique = std::iter::once(&id_index).chain(self.schema.unique_indexes());
        for index in unique {
            let fields: Vec<&str> = index.fields().collect();
            let keys = index_keys(doc, &fields);

            let collides = self
                .documents
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .any(|(_, other)| keys_overlap(&keys, &index_keys(other, &fields)));

            if collides {
                let name = if index.keys[0].0 == "_id" {
                    "_id_".to_string()
                } else {
                    index.name()
                };
                return Err(BiscaError::DuplicateKey {
                    collection: self.schema.name.clone(),
                    index: name,
                });
            }
        }
        Ok(())
    }

    /// Add the indexes of `schema` this collection does not declare yet.
    fn ensure_indexes(&mut self, schema: &CollectionSchema) -> AdapterResult<()> {
        for index in &schema.indexes {
            if self.schema.indexes.contains(index) {
                continue;
            }
            if index.unique {
                let fields: Vec<&str> = index.fields().collect();
                for (i, a) in self.documents.iter().enumerate() {
                    let keys = index_keys(a, &fields);
                    let clash = self.documents[i + 1..]
                        .iter()
                        .any(|b| keys_overlap(&keys, &index_keys(b, &fields)));
                    if clash {
                        return Err(BiscaError::DuplicateKey {
                            collection: self.schema.name.clone(),
                            index: index.name(),
                        });
                    }
                }
            }
            debug!(collection = %self.schema.name, index = %index.name(), "Created index");
            self.schema.indexes.push(index.clone());
        }
        Ok(())
    }
}

fn keys_overlap(a: &[Vec<Bson>], b: &[Vec<Bson>]) -> bool {
    a.iter().any(|ka| {
        b.iter().any(|kb| {
            ka.len() == kb.len() && ka.iter().zip(kb).all(|(x, y)| values_equal(x, y))
        })
    })
}

/// Type alias for the in-memory store.
type Collections = HashMap<String, Collection>;

/// In-memory storage adapter.
///
/// Data is lost when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct MemoryAdapter {
    store: Arc<RwLock<Collections>>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    /// Create an adapter with no collections.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create an adapter with every collection of `schema` already created.
    pub fn with_schema(schema: &DatabaseSchema) -> Self {
        let collections = schema
            .collections
            .iter()
            .map(|c| (c.name.clone(), Collection::new(c.clone())))
            .collect();
        Self {
            store: Arc::new(RwLock::new(collections)),
        }
    }

    /// Get a snapshot of all documents (for debugging/testing).
    pub async fn snapshot(&self) -> HashMap<String, Vec<Document>> {
        self.store
            .read()
            .await
            .iter()
            .map(|(name, c)| (name.clone(), c.documents.clone()))
            .collect()
    }

    /// Remove every document, keeping collections and schemas.
    pub async fn clear(&self) {
        for collection in self.store.write().await.values_mut() {
            collection.documents.clear();
        }
    }

    /// Get the document count for a collection.
    pub async fn model_count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    /// The validator and indexes a collection was created with.
    pub async fn schema_of(&self, collection: &str) -> Option<CollectionSchema> {
        self.store
            .read()
            .await
            .get(collection)
            .map(|c| c.schema.clone())
    }
}

fn unknown(collection: &str) -> BiscaError {
    BiscaError::UnknownCollection(collection.to_string())
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn create_schema(
        &self,
        schema: &DatabaseSchema,
        options: &SchemaOptions,
    ) -> AdapterResult<SchemaStatus> {
        let mut store = self.store.write().await;
        let mut status = SchemaStatus::default();

        for collection in &schema.collections {
            match store.get_mut(&collection.name) {
                Some(existing) if options.if_not_exists => {
                    warn!(collection = %collection.name, "Collection exists, skipping");
                    existing.ensure_indexes(collection)?;
                    status.skipped.push(collection.name.clone());
                }
                Some(_) => return Err(BiscaError::CollectionExists(collection.name.clone())),
                None => {
                    let mut created = Collection::new(collection.clone());
                    created.schema.indexes.clear();
                    created.ensure_indexes(collection)?;
                    store.insert(collection.name.clone(), created);
                    info!(collection = %collection.name, "Created collection");
                    status.created.push(collection.name.clone());
                }
            }
            status.indexes += collection.indexes.len();
        }

        Ok(status)
    }

    async fn list_collections(&self) -> AdapterResult<Vec<String>> {
        let mut names: Vec<String> = self.store.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> AdapterResult<()> {
        let mut store = self.store.write().await;
        let coll = store.get_mut(collection).ok_or_else(|| unknown(collection))?;

        if !doc.contains_key("_id") {
            doc.insert("_id", ObjectId::new());
        }
        coll.admit(&doc, None)?;
        coll.documents.push(doc);
        Ok(())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> AdapterResult<Option<Document>> {
        let store = self.store.read().await;
        let coll = store.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(coll
            .documents
            .iter()
            .find(|d| matches_filter(d, &filter))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: &str,
        query: FindManyQuery,
    ) -> AdapterResult<Vec<Document>> {
        let store = self.store.read().await;
        let coll = store.get(collection).ok_or_else(|| unknown(collection))?;

        let mut result: Vec<Document> = coll
            .documents
            .iter()
            .filter(|d| matches_filter(d, &query.filter))
            .cloned()
            .collect();

        if let Some(ref sort) = query.sort_by {
            result.sort_by(|a, b| {
                let ord = compare_at(a, b, &sort.field);
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        // A zero limit means no limit.
        if let Some(limit) = query.limit.filter(|l| *l != 0) {
            result.truncate(limit.unsigned_abs() as usize);
        }

        Ok(result)
    }

    async fn count(&self, collection: &str, filter: Document) -> AdapterResult<u64> {
        let store = self.store.read().await;
        let coll = store.get(collection).ok_or_else(|| unknown(collection))?;
        let count = coll
            .documents
            .iter()
            .filter(|d| matches_filter(d, &filter))
            .count();
        Ok(count as u64)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> AdapterResult<bool> {
        let mut store = self.store.write().await;
        let coll = store.get_mut(collection).ok_or_else(|| unknown(collection))?;

        let Some(pos) = coll
            .documents
            .iter()
            .position(|d| matches_filter(d, &filter))
        else {
            return Ok(false);
        };

        let mut updated = coll.documents[pos].clone();
        for (path, value) in set {
            if path == "_id" && updated.get("_id") != Some(&value) {
                return Err(BiscaError::Database(format!(
                    "Performing an update on the path '_id' would modify the immutable field '_id' in `{collection}`"
                )));
            }
            if !set_path(&mut updated, &path, value) {
                return Err(BiscaError::Database(format!(
                    "Cannot create field along path '{path}' in `{collection}`"
                )));
            }
        }

        coll.admit(&updated, Some(pos))?;
        coll.documents[pos] = updated;
        Ok(true)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        mut doc: Document,
    ) -> AdapterResult<bool> {
        let mut store = self.store.write().await;
        let coll = store.get_mut(collection).ok_or_else(|| unknown(collection))?;

        let Some(pos) = coll
            .documents
            .iter()
            .position(|d| matches_filter(d, &filter))
        else {
            return Ok(false);
        };

        let stored_id = coll.documents[pos].get("_id").cloned();
        match (doc.get("_id"), stored_id) {
            (Some(new_id), Some(ref old_id)) if new_id != old_id => {
                return Err(BiscaError::Database(format!(
                    "The _id field cannot be changed by a replacement in `{collection}`"
                )));
            }
            (None, Some(old_id)) => {
                doc.insert("_id", old_id);
            }
            _ => {}
        }

        coll.admit(&doc, Some(pos))?;
        coll.documents[pos] = doc;
        Ok(true)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> AdapterResult<u64> {
        let mut store = self.store.write().await;
        let coll = store.get_mut(collection).ok_or_else(|| unknown(collection))?;
        let before = coll.documents.len();
        coll.documents.retain(|d| !matches_filter(d, &filter));
        Ok((before - coll.documents.len()) as u64)
    }

    async fn drop_collection(&self, collection: &str) -> AdapterResult<()> {
        if self.store.write().await.remove(collection).is_some() {
            info!(collection, "Dropped collection");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisca_core::db::schema::{FieldSchema, IndexDirection, ObjectSchema};
    use bisca_core::db::adapter::SortBy;
    use bson::doc;

    fn schema() -> DatabaseSchema {
        DatabaseSchema::new("test")
            .collection(
                CollectionSchema::new(
                    "players",
                    ObjectSchema::new()
                        .required("id", FieldSchema::string())
                        .required("name", FieldSchema::string())
                        .optional("score", FieldSchema::int())
                        .optional("status", FieldSchema::string_enum(&["On", "Off"])),
                )
                .index(IndexSpec::asc("id").unique())
                .index(IndexSpec::desc("score")),
            )
            .collection(
                CollectionSchema::new(
                    "edges",
                    ObjectSchema::new()
                        .required("a", FieldSchema::string())
                        .optional("b", FieldSchema::string()),
                )
                .index(
                    IndexSpec::asc("a")
                        .then("b", IndexDirection::Ascending)
                        .unique(),
                ),
            )
    }

    async fn adapter() -> MemoryAdapter {
        let adapter = MemoryAdapter::new();
        adapter
            .create_schema(&schema(), &SchemaOptions::default())
            .await
            .unwrap();
        adapter
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "p1", "name": "Alice" })
            .await
            .unwrap();

        let found = adapter
            .find_one("players", doc! { "id": "p1" })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("name").unwrap(), "Alice");
        assert!(matches!(found.get("_id"), Some(Bson::ObjectId(_))));
    }

    #[tokio::test]
    async fn test_find_one_not_found() {
        let adapter = adapter().await;
        let found = adapter.find_one("players", doc! { "id": "nope" }).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let adapter = MemoryAdapter::new();
        let err = adapter
            .insert_one("players", doc! { "id": "p1" })
            .await
            .unwrap_err();
        assert!(matches!(err, BiscaError::UnknownCollection(ref c) if c == "players"));
    }

    #[tokio::test]
    async fn test_invalid_insert_rejected() {
        let adapter = adapter().await;
        let err = adapter
            .insert_one("players", doc! { "id": "p1", "name": "A", "score": 1.5 })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(adapter.model_count("players").await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "p1", "name": "A" })
            .await
            .unwrap();
        let err = adapter
            .insert_one("players", doc! { "id": "p1", "name": "B" })
            .await
            .unwrap_err();
        match err {
            BiscaError::DuplicateKey { collection, index } => {
                assert_eq!(collection, "players");
                assert_eq!(index, "id_1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_object_id_rejected() {
        let adapter = adapter().await;
        let oid = ObjectId::new();
        adapter
            .insert_one("players", doc! { "_id": oid, "id": "p1", "name": "A" })
            .await
            .unwrap();
        let err = adapter
            .insert_one("players", doc! { "_id": oid, "id": "p2", "name": "B" })
            .await
            .unwrap_err();
        assert!(matches!(err, BiscaError::DuplicateKey { ref index, .. } if index == "_id_"));
    }

    #[tokio::test]
    async fn test_compound_unique_missing_key_is_null() {
        let adapter = adapter().await;
        adapter.insert_one("edges", doc! { "a": "x" }).await.unwrap();
        adapter
            .insert_one("edges", doc! { "a": "x", "b": "y" })
            .await
            .unwrap();
        let err = adapter.insert_one("edges", doc! { "a": "x" }).await.unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_find_many_sorted_and_limited() {
        let adapter = adapter().await;
        for (id, score) in [("a", 3), ("b", 9), ("c", 5)] {
            adapter
                .insert_one("players", doc! { "id": id, "name": id, "score": score })
                .await
                .unwrap();
        }

        let top = adapter
            .find_many(
                "players",
                FindManyQuery::default().sort(SortBy::desc("score")).limit(2),
            )
            .await
            .unwrap();
        let ids: Vec<&str> = top.iter().map(|d| d.get_str("id").unwrap()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let all = adapter
            .find_many("players", FindManyQuery::default().sort(SortBy::asc("id")))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].get_str("id").unwrap(), "a");
    }

    #[tokio::test]
    async fn test_count() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A", "status": "On" })
            .await
            .unwrap();
        adapter
            .insert_one("players", doc! { "id": "b", "name": "B", "status": "Off" })
            .await
            .unwrap();
        assert_eq!(adapter.count("players", doc! { "status": "On" }).await.unwrap(), 1);
        assert_eq!(adapter.count("players", doc! {}).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_one() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A" })
            .await
            .unwrap();

        let matched = adapter
            .update_one("players", doc! { "id": "a" }, doc! { "score": 4 })
            .await
            .unwrap();
        assert!(matched);

        let found = adapter.find_one("players", doc! { "id": "a" }).await.unwrap().unwrap();
        assert_eq!(found.get_i32("score").unwrap(), 4);

        let matched = adapter
            .update_one("players", doc! { "id": "zzz" }, doc! { "score": 1 })
            .await
            .unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_document() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A", "status": "On" })
            .await
            .unwrap();
        adapter
            .insert_one("players", doc! { "id": "b", "name": "B" })
            .await
            .unwrap();

        let err = adapter
            .update_one("players", doc! { "id": "a" }, doc! { "status": "Maybe" })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = adapter
            .update_one("players", doc! { "id": "a" }, doc! { "id": "b" })
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());

        let found = adapter.find_one("players", doc! { "id": "a" }).await.unwrap().unwrap();
        assert_eq!(found.get_str("status").unwrap(), "On");
    }

    #[tokio::test]
    async fn test_update_same_unique_key_is_allowed() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A" })
            .await
            .unwrap();
        adapter
            .update_one("players", doc! { "id": "a" }, doc! { "id": "a", "name": "Z" })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_one_drops_missing_fields() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A", "score": 7 })
            .await
            .unwrap();
        let before = adapter.find_one("players", doc! { "id": "a" }).await.unwrap().unwrap();

        let matched = adapter
            .replace_one("players", doc! { "id": "a" }, doc! { "id": "a", "name": "B" })
            .await
            .unwrap();
        assert!(matched);

        let after = adapter.find_one("players", doc! { "id": "a" }).await.unwrap().unwrap();
        assert_eq!(after.get_str("name").unwrap(), "B");
        assert!(!after.contains_key("score"));
        assert_eq!(after.get("_id"), before.get("_id"));

        let matched = adapter
            .replace_one("players", doc! { "id": "zzz" }, doc! { "id": "zzz", "name": "Z" })
            .await
            .unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn test_rejected_replace_leaves_document() {
        let adapter = adapter().await;
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A", "score": 7 })
            .await
            .unwrap();
        adapter
            .insert_one("players", doc! { "id": "b", "name": "B" })
            .await
            .unwrap();

        let err = adapter
            .replace_one("players", doc! { "id": "a" }, doc! { "id": "a" })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = adapter
            .replace_one("players", doc! { "id": "a" }, doc! { "id": "b", "name": "A" })
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());

        let err = adapter
            .replace_one(
                "players",
                doc! { "id": "a" },
                doc! { "_id": ObjectId::new(), "id": "a", "name": "A" },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BiscaError::Database(_)));

        let found = adapter.find_one("players", doc! { "id": "a" }).await.unwrap().unwrap();
        assert_eq!(found.get_i32("score").unwrap(), 7);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let adapter = adapter().await;
        for id in ["a", "b", "c"] {
            adapter
                .insert_one("players", doc! { "id": id, "name": "same" })
                .await
                .unwrap();
        }
        let removed = adapter
            .delete_many("players", doc! { "name": "same" })
            .await
            .unwrap();
        assert_eq!(removed, 3);
        assert_eq!(adapter.model_count("players").await, 0);
    }

    #[tokio::test]
    async fn test_create_schema_twice_fails() {
        let adapter = adapter().await;
        let err = adapter
            .create_schema(&schema(), &SchemaOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BiscaError::CollectionExists(ref c) if c == "players"));
    }

    #[tokio::test]
    async fn test_create_schema_if_not_exists() {
        let adapter = adapter().await;
        let status = adapter
            .create_schema(&schema(), &SchemaOptions { if_not_exists: true })
            .await
            .unwrap();
        assert!(status.created.is_empty());
        assert_eq!(status.skipped, vec!["players", "edges"]);
        assert_eq!(status.indexes, 3);
    }

    #[tokio::test]
    async fn test_ensure_unique_index_on_existing_duplicates() {
        let adapter = MemoryAdapter::new();
        let loose = DatabaseSchema::new("test").collection(CollectionSchema::new(
            "players",
            ObjectSchema::new().required("id", FieldSchema::string()),
        ));
        adapter
            .create_schema(&loose, &SchemaOptions::default())
            .await
            .unwrap();
        adapter.insert_one("players", doc! { "id": "a" }).await.unwrap();
        adapter.insert_one("players", doc! { "id": "a" }).await.unwrap();

        let strict = DatabaseSchema::new("test").collection(
            CollectionSchema::new("players", ObjectSchema::new())
                .index(IndexSpec::asc("id").unique()),
        );
        let err = adapter
            .create_schema(&strict, &SchemaOptions { if_not_exists: true })
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_drop_and_list_collections() {
        let adapter = adapter().await;
        assert_eq!(
            adapter.list_collections().await.unwrap(),
            vec!["edges", "players"]
        );
        adapter.drop_collection("edges").await.unwrap();
        adapter.drop_collection("edges").await.unwrap();
        assert_eq!(adapter.list_collections().await.unwrap(), vec!["players"]);
        assert!(adapter.schema_of("edges").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_and_snapshot() {
        let adapter = MemoryAdapter::with_schema(&schema());
        adapter
            .insert_one("players", doc! { "id": "a", "name": "A" })
            .await
            .unwrap();
        assert_eq!(adapter.snapshot().await["players"].len(), 1);
        adapter.clear().await;
        assert_eq!(adapter.model_count("players").await, 0);
        assert!(adapter.schema_of("players").await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_of_one_key() {
        let adapter = adapter().await;
        let mut handles = Vec::new();
        for i in 0..8 {
            let adapter = adapter.clone();
            handles.push(tokio::spawn(async move {
                adapter
                    .insert_one("players", doc! { "id": "same", "name": format!("n{i}") })
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(adapter.model_count("players").await, 1);
    }
}
