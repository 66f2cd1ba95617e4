//! FileStore against the backend contract, plus log replay

mod common;

use std::fs;
use std::io::Write;
use std::sync::Arc;

use linkvault::storage::file::LogEntry;
use linkvault::storage::{FileStore, InsertOutcome, Lookup, StoreStats, UrlStore};
use tempfile::TempDir;

fn open_store() -> (Arc<dyn UrlStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileStore::open(temp_dir.path().join("urls.jsonl")).expect("Failed to open store");
    (Arc::new(store), temp_dir)
}

fn read_log(dir: &TempDir) -> Vec<LogEntry> {
    fs::read_to_string(dir.path().join("urls.jsonl"))
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_insert_is_idempotent() {
    let (store, _dir) = open_store();
    common::insert_is_idempotent(store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_create_once() {
    let (store, dir) = open_store();
    common::concurrent_inserts_create_once(store, 32).await;

    // 只有一次成功插入写入日志
    assert_eq!(read_log(&dir).len(), 1);
}

#[tokio::test]
async fn test_read_reports_all_states() {
    let (store, _dir) = open_store();
    common::read_reports_all_states(store).await;
}

#[tokio::test]
async fn test_deleted_url_can_be_shortened_again() {
    let (store, _dir) = open_store();
    common::deleted_url_can_be_shortened_again(store).await;
}

#[tokio::test]
async fn test_short_keys_are_never_reused() {
    let (store, _dir) = open_store();
    common::short_keys_are_never_reused(store).await;
}

#[tokio::test]
async fn test_delete_respects_ownership() {
    let (store, _dir) = open_store();
    common::delete_respects_ownership(store).await;
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (store, dir) = open_store();
    common::delete_is_idempotent(store).await;

    // 一条创建 + 一条墓碑
    let log = read_log(&dir);
    assert_eq!(log.len(), 2);
    assert!(log[1].is_deleted);
}

#[tokio::test]
async fn test_read_all_by_owner_lists_active_links() {
    let (store, _dir) = open_store();
    common::read_all_by_owner_lists_active_links(store).await;
}

#[tokio::test]
async fn test_count_tracks_active_records() {
    let (store, _dir) = open_store();
    common::count_tracks_active_records(store).await;
}

#[tokio::test]
async fn test_ping_and_name() {
    let (store, _dir) = open_store();
    common::ping_succeeds(Arc::clone(&store)).await;
    assert_eq!(store.backend_name(), "file");
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("urls.jsonl");

    {
        let store = FileStore::open(&path).unwrap();
        store
            .insert("key00001", common::URL_A, Some("u1"))
            .await
            .unwrap();
        store
            .insert("key00002", common::URL_B, Some("u2"))
            .await
            .unwrap();
        store
            .soft_delete_batch("u1", &common::keys(&["key00001"]))
            .await
            .unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    assert!(reopened.read("key00001").await.unwrap().is_deleted());
    assert_eq!(
        reopened.read("key00002").await.unwrap(),
        Lookup::Active(common::URL_B.to_string())
    );
    assert_eq!(
        reopened.count().await.unwrap(),
        StoreStats { urls: 1, owners: 1 }
    );

    // 重放后去重依旧生效
    let again = reopened
        .insert("key00003", common::URL_B, None)
        .await
        .unwrap();
    assert_eq!(again.outcome, InsertOutcome::AlreadyExists);
    assert_eq!(again.short_key, "key00002");
}

#[tokio::test]
async fn test_replay_skips_malformed_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("urls.jsonl");
    fs::write(
        &path,
        concat!(
            r#"{"uuid":"1","short_url":"key00001","original_url":"https://example.com/a"}"#,
            "\n",
            "this is not json\n",
            r#"{"uuid":"2","short_url":"key00002""#,
            "\n",
            r#"{"uuid":"3","short_url":"key00003","original_url":"https://example.com/c","owner":"u1"}"#,
            "\n",
        ),
    )
    .unwrap();

    let store = FileStore::open(&path).unwrap();

    assert_eq!(
        store.read("key00001").await.unwrap(),
        Lookup::Active("https://example.com/a".to_string())
    );
    assert_eq!(store.read("key00002").await.unwrap(), Lookup::Missing);
    assert_eq!(store.read_all_by_owner("u1").await.unwrap().len(), 1);
    assert_eq!(store.count().await.unwrap().urls, 2);
}

#[tokio::test]
async fn test_torn_last_line_does_not_corrupt_next_append() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("urls.jsonl");
    {
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            "{}\n{}",
            r#"{"uuid":"1","short_url":"key00001","original_url":"https://example.com/a"}"#,
            r#"{"uuid":"2","short_url":"key0"#
        )
        .unwrap();
    }

    {
        let store = FileStore::open(&path).unwrap();
        store
            .insert("key00002", common::URL_B, Some("u1"))
            .await
            .unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    assert!(reopened.read("key00001").await.unwrap().found());
    assert_eq!(
        reopened.read("key00002").await.unwrap(),
        Lookup::Active(common::URL_B.to_string())
    );
}

#[tokio::test]
async fn test_open_creates_missing_file_and_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("urls.jsonl");

    let store = FileStore::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
    assert_eq!(store.count().await.unwrap(), StoreStats::default());
}

#[tokio::test]
async fn test_invalid_candidate_keys_are_rejected() {
    let (store, dir) = open_store();
    common::invalid_candidate_keys_are_rejected(store).await;

    // 只有合法短码的那一行落盘
    let log = read_log(&dir);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].short_url, "k".repeat(32));
}

#[tokio::test]
async fn test_accepted_insert_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("urls.jsonl");

    {
        let store = FileStore::open(&path).unwrap();
        assert!(store.insert("my-key", common::URL_A, Some("u1")).await.is_err());
        let inserted = store
            .insert("myKey001", common::URL_A, Some("u1"))
            .await
            .unwrap();
        assert!(inserted.is_created());
    }

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.read("my-key").await.unwrap(), Lookup::Missing);
    assert_eq!(
        reopened.read("myKey001").await.unwrap(),
        Lookup::Active(common::URL_A.to_string())
    );
}

#[tokio::test]
async fn test_long_urls_sharing_a_prefix_are_distinct() {
    let (store, _dir) = open_store();
    common::long_urls_sharing_a_prefix_are_distinct(store).await;
}
