// Runs against a real server. Start one and run with:
//   MONGODB_URI=mongodb://localhost:27017 cargo test -p bisca-mongodb -- --ignored

use std::sync::Arc;

use bisca_core::{Adapter, BiscaError, DatabaseSchema, SchemaOptions};
use bisca_mongodb::MongoAdapter;
use bisca_test_utils::{TestAdapter, TestAdapterConfig};

const TEST_DB: &str = "biscaDB_conformance";

async fn connect(db_name: &str) -> MongoAdapter {
    let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    MongoAdapter::connect(&uri, db_name).await.unwrap()
}

#[tokio::test]
#[ignore = "needs a running MongoDB server"]
async fn mongo_adapter_passes_conformance() {
    let adapter = Arc::new(connect(TEST_DB).await);
    let config = TestAdapterConfig::new("mongodb", adapter, DatabaseSchema::bisca_named(TEST_DB));

    let mut runner = TestAdapter::new(config);
    runner.execute().await.unwrap();
    assert_eq!(runner.stats().len(), 4);
}

#[tokio::test]
#[ignore = "needs a running MongoDB server"]
async fn server_enforces_validator_without_local_registry() {
    let db_name = format!("{TEST_DB}_server");
    let adapter = connect(&db_name).await;
    let schema = DatabaseSchema::bisca_named(&db_name);
    for name in schema.collection_names() {
        adapter.drop_collection(name).await.unwrap();
    }
    adapter
        .create_schema(&schema, &SchemaOptions::default())
        .await
        .unwrap();

    // A fresh handle knows nothing about the validators; only the server does.
    let attached = connect(&db_name).await;
    let err = attached
        .insert_one("users", mongodb::bson::doc! { "id": "u1" })
        .await
        .unwrap_err();
    match err {
        BiscaError::Validation { errors, .. } => {
            assert_eq!(errors[0].path, "$");
            assert!(errors[0].is_rejected());
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Once registered, the same write is caught locally with its paths.
    attached.register(&schema).await;
    let err = attached
        .insert_one("users", mongodb::bson::doc! { "id": "u1" })
        .await
        .unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.iter().any(|e| e.path == "username" && e.is_missing_field()));

    let err = adapter
        .create_schema(&schema, &SchemaOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BiscaError::CollectionExists(name) if name == "users"));

    for name in schema.collection_names() {
        adapter.drop_collection(name).await.unwrap();
    }
}
