use super::*;
use capturekit_protocols::KeyValueStore;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_memory_store_get_set_remove() {
    let store = MemoryStore::new();
    store.set("a", json!(1)).await.unwrap();
    store.set("b", json!("two")).await.unwrap();

    let got = store.get(&["a", "b", "missing"]).await.unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got["a"], json!(1));

    store.remove(&["a", "missing"]).await.unwrap();
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_file_store_persists_across_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("durable.json");

    {
        let store = FileStore::open(&path).await.unwrap();
        store.set("isCapturingLogs", json!(true)).await.unwrap();
        store.set("apiKey", json!("k-123")).await.unwrap();
    }

    let reopened = FileStore::open(&path).await.unwrap();
    let got = reopened.get(&["isCapturingLogs", "apiKey"]).await.unwrap();
    assert_eq!(got["isCapturingLogs"], json!(true));
    assert_eq!(got["apiKey"], json!("k-123"));
}

#[tokio::test]
async fn test_file_store_remove_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("durable.json");

    let store = FileStore::open(&path).await.unwrap();
    store.set("historyCache", json!({"sessions": []})).await.unwrap();
    store.remove(&["historyCache"]).await.unwrap();

    let reopened = FileStore::open(&path).await.unwrap();
    assert!(reopened.get(&["historyCache"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_store_corrupt_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("durable.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = FileStore::open(&path).await.unwrap();
    assert!(store.get(&["anything"]).await.unwrap().is_empty());
    assert_eq!(store.path(), path.as_path());
}
