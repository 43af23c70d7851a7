use super::*;
use crate::store::{FileStore, MemoryStore};
use capturekit_testing::{FailingStore, MockHost, fixtures};
use serde_json::json;
use tempfile::TempDir;

fn manager_with(
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
    host: &MockHost,
) -> StateManager {
    StateManager::new(durable, ephemeral, Arc::new(host.clone()))
}

fn memory_manager(host: &MockHost) -> (StateManager, Arc<MemoryStore>, Arc<MemoryStore>) {
    let durable = Arc::new(MemoryStore::new());
    let ephemeral = Arc::new(MemoryStore::new());
    let manager = manager_with(durable.clone(), ephemeral.clone(), host);
    (manager, durable, ephemeral)
}

#[tokio::test]
async fn test_defaults_on_empty_stores() {
    let host = MockHost::new();
    let (manager, _, _) = memory_manager(&host);
    manager.initialize().await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot, StateSnapshot::default());
    assert!(manager.is_initialized());
    assert_eq!(manager.view_state(), ViewState::Select);
}

#[tokio::test]
async fn test_initialize_loads_both_partitions() {
    let host = MockHost::new();
    let durable = Arc::new(MemoryStore::new());
    let ephemeral = Arc::new(MemoryStore::new());
    durable.set(keys::IS_CAPTURING_LOGS, json!(true)).await.unwrap();
    durable.set(keys::DEBUGGING_TAB_ID, json!(7)).await.unwrap();
    durable.set(keys::API_KEY, json!("secret")).await.unwrap();
    ephemeral
        .set(keys::CAPTURED_ELEMENT, serde_json::to_value(fixtures::element(7)).unwrap())
        .await
        .unwrap();
    ephemeral.set(keys::CAPTURED_TAB_ID, json!(7)).await.unwrap();
    ephemeral.set(keys::VIEW_STATE, json!("task")).await.unwrap();
    ephemeral.set(keys::DRAFT_TASK_TEXT, json!("fix the button")).await.unwrap();

    let manager = manager_with(durable, ephemeral, &host);
    manager.initialize().await;

    assert!(manager.is_capturing_logs());
    assert!(!manager.is_capturing_network());
    assert_eq!(manager.debugging_tab_id(), Some(7));
    assert_eq!(manager.api_key().as_deref(), Some("secret"));
    assert_eq!(manager.captured_element(), Some(fixtures::element(7)));
    assert_eq!(manager.view_state(), ViewState::Task);
    assert_eq!(manager.draft_task_text(), "fix the button");
}

#[tokio::test]
async fn test_malformed_values_fall_back_to_defaults() {
    let host = MockHost::new();
    let durable = Arc::new(MemoryStore::new());
    durable.set(keys::IS_CAPTURING_LOGS, json!("yes")).await.unwrap();
    durable.set(keys::DEBUGGING_TAB_ID, Value::Null).await.unwrap();
    durable.set(keys::MOST_RECENT_REPOS, json!({"not": "a list"})).await.unwrap();

    let manager = manager_with(durable, Arc::new(MemoryStore::new()), &host);
    manager.initialize().await;

    assert!(!manager.is_capturing_logs());
    assert_eq!(manager.debugging_tab_id(), None);
    assert!(manager.most_recent_repos().is_empty());
}

#[tokio::test]
async fn test_unreadable_store_keeps_defaults() {
    let host = MockHost::new();
    let manager = manager_with(
        Arc::new(FailingStore::unreadable()),
        Arc::new(MemoryStore::new()),
        &host,
    );
    manager.initialize().await;
    assert!(manager.is_initialized());
    assert_eq!(manager.capture_flags(), CaptureFlags::default());
}

#[tokio::test]
async fn test_initialize_runs_once() {
    let host = MockHost::new();
    let (manager, durable, _) = memory_manager(&host);
    manager.initialize().await;

    // A later write straight to the store must not be picked up by a second call.
    durable.set(keys::IS_CAPTURING_CSS, json!(true)).await.unwrap();
    manager.initialize().await;
    assert!(!manager.is_capturing_css());
}

#[tokio::test]
async fn test_setters_update_mirror_and_persist() {
    let host = MockHost::new();
    let (manager, durable, ephemeral) = memory_manager(&host);
    manager.initialize().await;

    manager.set_capturing_network(true).await;
    manager.set_debugging_tab_id(Some(3)).await;
    manager.set_view_state(ViewState::History).await;
    manager.set_draft_task_text("draft".to_string()).await;

    assert!(manager.is_capturing_network());
    assert_eq!(manager.debugging_tab_id(), Some(3));

    let stored = durable
        .get(&[keys::IS_CAPTURING_NETWORK, keys::DEBUGGING_TAB_ID])
        .await
        .unwrap();
    assert_eq!(stored[keys::IS_CAPTURING_NETWORK], json!(true));
    assert_eq!(stored[keys::DEBUGGING_TAB_ID], json!(3));

    let stored = ephemeral.get(&[keys::VIEW_STATE, keys::DRAFT_TASK_TEXT]).await.unwrap();
    assert_eq!(stored[keys::VIEW_STATE], json!("history"));
    assert_eq!(stored[keys::DRAFT_TASK_TEXT], json!("draft"));
}

#[tokio::test]
async fn test_persistence_failure_keeps_mirror() {
    let host = MockHost::new();
    let manager = manager_with(
        Arc::new(FailingStore::new()),
        Arc::new(FailingStore::new()),
        &host,
    );
    manager.initialize().await;

    manager.set_capturing_logs(true).await;
    manager.set_captured_tab_id(Some(4)).await;
    manager.reset_state(true).await;

    assert!(manager.is_capturing_logs());
    assert_eq!(manager.captured_tab_id(), None);
}

#[tokio::test]
async fn test_restart_recovers_durable_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("durable.json");
    let host = MockHost::new();

    {
        let durable = Arc::new(FileStore::open(&path).await.unwrap());
        let manager = manager_with(durable, Arc::new(MemoryStore::new()), &host);
        manager.initialize().await;
        manager.set_capturing_logs(true).await;
        manager.set_debugging_tab_id(Some(12)).await;
        manager.set_captured_tab_id(Some(12)).await;
    }

    // Fresh process: durable survives, ephemeral does not.
    let durable = Arc::new(FileStore::open(&path).await.unwrap());
    let manager = manager_with(durable, Arc::new(MemoryStore::new()), &host);
    manager.initialize().await;

    assert!(manager.is_capturing_logs());
    assert_eq!(manager.debugging_tab_id(), Some(12));
    assert_eq!(manager.captured_tab_id(), None);
}

#[tokio::test]
async fn test_captured_element_hidden_on_other_tab() {
    let host = MockHost::new();
    let (manager, _, _) = memory_manager(&host);
    manager.initialize().await;

    manager.set_captured_element(Some(fixtures::element(1))).await;
    manager.set_captured_tab_id(Some(1)).await;

    assert_eq!(manager.captured_element_for(1), Some(fixtures::element(1)));
    assert_eq!(manager.captured_element_for(2), None);
}

#[tokio::test]
async fn test_captured_element_requires_matching_owner() {
    let host = MockHost::new();
    let (manager, _, _) = memory_manager(&host);
    manager.initialize().await;

    // Owner id says tab 1 but the element itself was taken from tab 2.
    manager.set_captured_element(Some(fixtures::element(2))).await;
    manager.set_captured_tab_id(Some(1)).await;

    assert_eq!(manager.captured_element_for(1), None);
    assert_eq!(manager.captured_element_for(2), None);
}

#[tokio::test]
async fn test_soft_reset_keeps_ephemeral_keys() {
    let host = MockHost::new();
    let (manager, _, ephemeral) = memory_manager(&host);
    manager.initialize().await;

    manager.set_captured_element(Some(fixtures::element(1))).await;
    manager.set_captured_tab_id(Some(1)).await;
    manager.set_view_state(ViewState::Task).await;

    manager.reset_state(false).await;

    assert_eq!(manager.captured_element(), None);
    assert_eq!(manager.captured_tab_id(), Some(1));
    assert_eq!(manager.view_state(), ViewState::Task);
    assert_eq!(host.last_indicator(), Some(Indicator::Cleared));
    assert!(host.directives().is_empty());

    let stored = ephemeral.get(&[keys::CAPTURED_ELEMENT]).await.unwrap();
    assert!(stored.contains_key(keys::CAPTURED_ELEMENT));

    // Coming back to the owning tab brings the element back.
    let restored = manager.restore_captured_element().await;
    assert_eq!(restored, Some(fixtures::element(1)));
    assert_eq!(manager.captured_element_for(1), Some(fixtures::element(1)));
}

#[tokio::test]
async fn test_full_reset_cleans_up_and_removes_keys() {
    let host = MockHost::new();
    host.add_receiver(5);
    let (manager, _, ephemeral) = memory_manager(&host);
    manager.initialize().await;

    manager.set_captured_element(Some(fixtures::element(5))).await;
    manager.set_captured_tab_id(Some(5)).await;
    manager.set_view_state(ViewState::Result).await;
    manager.set_draft_task_text("half-typed".to_string()).await;

    manager.reset_state(true).await;

    assert_eq!(manager.captured_element(), None);
    assert_eq!(manager.captured_tab_id(), None);
    assert_eq!(manager.view_state(), ViewState::Select);
    assert_eq!(manager.draft_task_text(), "");
    assert_eq!(host.directives(), vec![(5, PickerDirective::CleanupSelector)]);
    assert!(ephemeral.is_empty().await);
}

#[tokio::test]
async fn test_full_reset_tolerates_closed_tab() {
    let host = MockHost::new();
    let (manager, _, _) = memory_manager(&host);
    manager.initialize().await;

    // Tab 9 has no picker listening any more.
    manager.set_captured_tab_id(Some(9)).await;
    manager.reset_state(true).await;

    assert_eq!(manager.captured_tab_id(), None);
    assert!(host.directives().is_empty());
}

#[tokio::test]
async fn test_remember_repo_most_recent_first() {
    let host = MockHost::new();
    let (manager, durable, _) = memory_manager(&host);
    manager.initialize().await;

    let a = fixtures::source("acme", "a");
    let b = fixtures::source("acme", "b");
    let c = fixtures::source("acme", "c");
    let d = fixtures::source("acme", "d");

    for s in [&a, &b, &c] {
        manager.remember_repo(s.clone()).await;
    }
    assert_eq!(manager.most_recent_repos(), vec![c.clone(), b.clone(), a.clone()]);

    manager.remember_repo(a.clone()).await;
    assert_eq!(manager.most_recent_repos(), vec![a.clone(), c.clone(), b.clone()]);

    let list = manager.remember_repo(d.clone()).await;
    assert_eq!(list, vec![d.clone(), a.clone(), c.clone()]);

    let stored = durable.get(&[keys::MOST_RECENT_REPOS]).await.unwrap();
    let stored: Vec<Source> = serde_json::from_value(stored[keys::MOST_RECENT_REPOS].clone()).unwrap();
    assert_eq!(stored, list);
}

#[tokio::test]
async fn test_history_cache_cleared() {
    let host = MockHost::new();
    let (manager, durable, _) = memory_manager(&host);
    manager.initialize().await;

    manager
        .set_history_cache(HistoryCache {
            sessions: vec![fixtures::session("s1", "Fix it")],
        })
        .await;
    assert!(manager.history_cache().is_some());

    manager.clear_history_cache().await;
    assert!(manager.history_cache().is_none());
    assert!(durable.get(&[keys::HISTORY_CACHE]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_handles_are_shared() {
    let host = MockHost::new();
    let (manager, _, _) = memory_manager(&host);

    let logs = manager.captured_logs();
    logs.push(CapturedLogRecord {
        timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        level: "log".to_string(),
        message: "hi".to_string(),
    });
    assert_eq!(manager.captured_logs().len(), 1);

    manager.clear_captured_logs();
    assert!(logs.is_empty());
    assert!(manager.captured_network().same_list(&manager.captured_network()));
}
