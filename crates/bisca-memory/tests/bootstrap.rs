use std::sync::Arc;

use bson::doc;

use bisca_core::{Adapter, BiscaError, DatabaseSchema, GameRules, GameInfo, SchemaOptions, Store};
use bisca_memory::MemoryAdapter;
use bisca_test_utils::fixtures::game_info_doc;

#[tokio::test]
async fn bootstrap_creates_every_collection_and_index() {
    let adapter = MemoryAdapter::new();
    let schema = DatabaseSchema::bisca();

    let status = adapter
        .create_schema(&schema, &SchemaOptions::default())
        .await
        .unwrap();

    assert_eq!(status.created.len(), 9);
    assert!(status.skipped.is_empty());
    assert_eq!(status.indexes, 41);

    let states = adapter.schema_of("game_states").await.unwrap();
    assert_eq!(states.indexes.len(), 8);
    assert!(states.indexes.iter().any(|i| i.name() == "players.player_id_1"));
}

#[tokio::test]
async fn write_before_bootstrap_is_rejected() {
    let adapter = MemoryAdapter::new();
    let err = adapter
        .insert_one("game_infos", game_info_doc("h1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BiscaError::UnknownCollection(_)));
}

#[tokio::test]
async fn reset_then_bootstrap_again() {
    let adapter = MemoryAdapter::with_schema(&DatabaseSchema::bisca());
    adapter
        .insert_one("game_infos", game_info_doc("h1"))
        .await
        .unwrap();

    for name in adapter.list_collections().await.unwrap() {
        adapter.drop_collection(&name).await.unwrap();
    }
    let status = adapter
        .create_schema(&DatabaseSchema::bisca(), &SchemaOptions::default())
        .await
        .unwrap();
    assert_eq!(status.created.len(), 9);
    assert_eq!(adapter.count("game_infos", doc! {}).await.unwrap(), 0);
}

#[tokio::test]
async fn store_over_memory_adapter() {
    let adapter = Arc::new(MemoryAdapter::with_schema(&DatabaseSchema::bisca()));
    let store = Store::new(adapter.clone());

    let info = GameInfo::new("table", "h1", "host", GameRules::default());
    store.insert(&info).await.unwrap();
    assert_eq!(adapter.model_count("game_infos").await, 1);

    let err = store
        .find_by_key::<GameInfo>(&["a", "b"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("keyed by 1 field"));
}
