// bisca-mongodb: the `Adapter` trait on top of the official MongoDB driver.
//
// Collections are created with their `$jsonSchema` validator attached
// (strict level, error action) and their indexes built right after, so the
// server enforces the same rules the in-memory store does.

pub mod adapter;
pub mod query;

pub use adapter::MongoAdapter;
