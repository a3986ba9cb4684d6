use bson::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// A typed record bound to its collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the record lives in.
    const COLLECTION: &'static str;

    /// Fields of the record's unique key, in index order.
    const KEY: &'static [&'static str];

    /// Equality filter selecting this record by its key.
    fn key_filter(&self) -> Document;

    fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    /// Decode a stored document. The store's `_id` is ignored.
    fn from_document(mut doc: Document) -> Result<Self> {
        doc.remove("_id");
        Ok(bson::from_document(doc)?)
    }
}
