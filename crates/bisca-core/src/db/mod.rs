pub mod adapter;
pub mod collections;
pub mod models;
pub mod path;
pub mod record;
pub mod schema;
pub mod store;
pub mod validator;

pub use adapter::{Adapter, AdapterResult, FindManyQuery, SchemaOptions, SchemaStatus, SortBy, SortDirection};
pub use record::Record;
pub use schema::{BsonType, CollectionSchema, DatabaseSchema, FieldSchema, IndexSpec, ObjectSchema};
pub use store::Store;
