// MongoAdapter: the core Adapter trait on a live MongoDB database.
//
// Collections registered through `create_schema` are also validated locally
// before each write, which turns a server-side "Document failed validation"
// into a list of located violations. The server stays authoritative: a write
// that passes the local check can still be rejected by it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::{CreateCollectionOptions, ValidationAction, ValidationLevel};
use mongodb::{Client, Collection, Database};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use bisca_core::db::adapter::{
    Adapter, AdapterResult, FindManyQuery, SchemaOptions, SchemaStatus,
};
use bisca_core::db::path::set_path;
use bisca_core::db::schema::{CollectionSchema, DatabaseSchema};
use bisca_core::error::BiscaError;

use crate::query;

/// MongoDB database adapter.
///
/// Cheap to clone: the driver handle and the validator registry are shared.
#[derive(Debug, Clone)]
pub struct MongoAdapter {
    db: Database,
    schemas: Arc<RwLock<HashMap<String, CollectionSchema>>>,
}

impl MongoAdapter {
    /// Create a new adapter from an existing database handle.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            schemas: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Connect to `uri` and use the database `db_name`.
    pub async fn connect(uri: &str, db_name: &str) -> AdapterResult<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| BiscaError::Database(format!("MongoDB connection failed: {e}")))?;
        debug!(db = db_name, "Connected to MongoDB");
        Ok(Self::new(client.database(db_name)))
    }

    /// Attach to a database whose collections were created earlier, so
    /// writes get validated locally without running `create_schema`.
    pub async fn register(&self, schema: &DatabaseSchema) {
        let mut schemas = self.schemas.write().await;
        for collection in &schema.collections {
            schemas.insert(collection.name.clone(), collection.clone());
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    /// Fail with `UnknownCollection` unless `name` exists, since the
    /// server would otherwise create it implicitly without a validator.
    async fn require_collection(&self, name: &str) -> AdapterResult<()> {
        if self.schemas.read().await.contains_key(name) {
            return Ok(());
        }
        if self.list_collections().await?.iter().any(|c| c == name) {
            return Ok(());
        }
        Err(BiscaError::UnknownCollection(name.to_string()))
    }

    async fn check_locally(&self, name: &str, doc: &Document) -> AdapterResult<()> {
        match self.schemas.read().await.get(name) {
            Some(schema) => schema.check(doc),
            None => Ok(()),
        }
    }

    async fn create_indexes(&self, schema: &CollectionSchema) -> AdapterResult<()> {
        let coll = self.collection(&schema.name);
        for spec in &schema.indexes {
            coll.create_index(query::index_model(spec))
                .await
                .map_err(|e| query::map_error(&schema.name, e))?;
            debug!(collection = %schema.name, index = %spec.name(), "Ensured index");
        }
        Ok(())
    }
}

#[async_trait]
impl Adapter for MongoAdapter {
    async fn create_schema(
        &self,
        schema: &DatabaseSchema,
        options: &SchemaOptions,
    ) -> AdapterResult<SchemaStatus> {
        let existing = self.list_collections().await?;
        let mut status = SchemaStatus::default();

        for collection in &schema.collections {
            if existing.contains(&collection.name) {
                if !options.if_not_exists {
                    return Err(BiscaError::CollectionExists(collection.name.clone()));
                }
                warn!(collection = %collection.name, "Collection exists, skipping");
                status.skipped.push(collection.name.clone());
            } else {
                let create = CreateCollectionOptions::builder()
                    .validator(collection.validator_document())
                    .validation_level(ValidationLevel::Strict)
                    .validation_action(ValidationAction::Error)
                    .build();
                self.db
                    .create_collection(&collection.name)
                    .with_options(create)
                    .await
                    .map_err(|e| query::map_error(&collection.name, e))?;
                info!(collection = %collection.name, "Created collection");
                status.created.push(collection.name.clone());
            }

            self.create_indexes(collection).await?;
            status.indexes += collection.indexes.len();
            self.schemas
                .write()
                .await
                .insert(collection.name.clone(), collection.clone());
        }

        Ok(status)
    }

    async fn list_collections(&self) -> AdapterResult<Vec<String>> {
        let mut names = self
            .db
            .list_collection_names()
            .await
            .map_err(|e| query::map_error(self.db.name(), e))?;
        names.sort();
        Ok(names)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> AdapterResult<()> {
        self.require_collection(collection).await?;
        self.check_locally(collection, &doc).await?;

        self.collection(collection)
            .insert_one(doc)
            .await
            .map_err(|e| query::map_error(collection, e))?;
        Ok(())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> AdapterResult<Option<Document>> {
        self.require_collection(collection).await?;
        self.collection(collection)
            .find_one(filter)
            .await
            .map_err(|e| query::map_error(collection, e))
    }

    async fn find_many(
        &self,
        collection: &str,
        query_params: FindManyQuery,
    ) -> AdapterResult<Vec<Document>> {
        self.require_collection(collection).await?;
        let find_opts = query::find_options(&query_params);

        let cursor = self
            .collection(collection)
            .find(query_params.filter)
            .with_options(find_opts)
            .await
            .map_err(|e| query::map_error(collection, e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| query::map_error(collection, e))
    }

    async fn count(&self, collection: &str, filter: Document) -> AdapterResult<u64> {
        self.require_collection(collection).await?;
        self.collection(collection)
            .count_documents(filter)
            .await
            .map_err(|e| query::map_error(collection, e))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> AdapterResult<bool> {
        self.require_collection(collection).await?;
        let coll = self.collection(collection);

        if self.schemas.read().await.contains_key(collection) {
            let Some(mut preview) = coll
                .find_one(filter.clone())
                .await
                .map_err(|e| query::map_error(collection, e))?
            else {
                return Ok(false);
            };
            for (path, value) in &set {
                if !set_path(&mut preview, path, value.clone()) {
                    return Err(BiscaError::Database(format!(
                        "Cannot create field along path '{path}' in `{collection}`"
                    )));
                }
            }
            self.check_locally(collection, &preview).await?;
        }

        let result = coll
            .update_one(filter, query::build_update_doc(set))
            .await
            .map_err(|e| query::map_error(collection, e))?;
        Ok(result.matched_count > 0)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        doc: Document,
    ) -> AdapterResult<bool> {
        self.require_collection(collection).await?;
        self.check_locally(collection, &doc).await?;

        let result = self
            .collection(collection)
            .replace_one(filter, doc)
            .await
            .map_err(|e| query::map_error(collection, e))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> AdapterResult<u64> {
        self.require_collection(collection).await?;
        let result = self
            .collection(collection)
            .delete_many(filter)
            .await
            .map_err(|e| query::map_error(collection, e))?;
        Ok(result.deleted_count)
    }

    async fn drop_collection(&self, collection: &str) -> AdapterResult<()> {
        let dropped = self.collection(collection).drop().await;
        self.schemas.write().await.remove(collection);

        match dropped {
            Ok(()) => Ok(()),
            Err(e) => match query::server_error(&e) {
                Some((query::codes::NAMESPACE_NOT_FOUND, _)) => Ok(()),
                _ => Err(query::map_error(collection, e)),
            },
        }
    }
}
