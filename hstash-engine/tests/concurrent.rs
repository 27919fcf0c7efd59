//! # Concurrent Access Tests
//!
//! Purpose: Verify the in-memory engine stays consistent when many tasks
//! write and delete through a shared handle.

use std::sync::Arc;

use bytes::Bytes;

use hstash_engine::{HashEngine, MemoryEngine};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_writers_land_every_field() {
    let engine = Arc::new(MemoryEngine::new());
    let mut tasks = Vec::new();
    for worker in 0..8 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            for n in 0..50 {
                let field = format!("w{worker}-{n}");
                engine
                    .hash_write_many("shared", vec![(field, Bytes::from(n.to_string()))])
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let fields = engine.hash_list_fields("shared").await.unwrap();
    assert_eq!(fields.len(), 8 * 50);
    assert_eq!(engine.commands_executed(), 8 * 50 + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_engine_as_trait_object() {
    let engine: Arc<dyn HashEngine> = Arc::new(MemoryEngine::new());
    let keys: Vec<String> = (0..16).map(|n| format!("user:{n}")).collect();
    for key in &keys {
        engine
            .hash_write_many(key, vec![("name".to_string(), Bytes::from_static(b"x"))])
            .await
            .unwrap();
    }
    assert_eq!(engine.search_keys("user:1?").await.unwrap().len(), 6);
    assert_eq!(engine.delete_keys(&keys).await.unwrap(), 16);
    assert!(engine.search_keys("*").await.unwrap().is_empty());
}
