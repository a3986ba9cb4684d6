// bisca-memory: in-process storage adapter for the Bisca schema.
//
// Enforces validators and unique indexes exactly like the MongoDB adapter,
// so the schema and the typed store can be tested without a database.

pub mod adapter;

pub use adapter::MemoryAdapter;
