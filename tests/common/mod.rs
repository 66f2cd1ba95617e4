//! Backend contract suite
//!
//! Every `UrlStore` implementation must pass these checks. Each backend test
//! file builds a fresh store per test and calls the functions below.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use linkvault::errors::LinkvaultError;
use linkvault::storage::{InsertOutcome, Lookup, StoreStats, UrlStore};

pub const URL_A: &str = "https://example.com/a";
pub const URL_B: &str = "https://example.com/b";
pub const URL_C: &str = "https://example.com/c";
pub const URL_D: &str = "https://example.com/d";

pub fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub async fn insert_is_idempotent(store: Arc<dyn UrlStore>) {
    let first = store.insert("key00001", URL_A, Some("u1")).await.unwrap();
    assert_eq!(first.outcome, InsertOutcome::Created);
    assert_eq!(first.short_key, "key00001");

    // 第二次的候选短码被丢弃
    let second = store.insert("key00002", URL_A, Some("u1")).await.unwrap();
    assert_eq!(second.outcome, InsertOutcome::AlreadyExists);
    assert_eq!(second.short_key, "key00001");

    assert_eq!(store.read("key00002").await.unwrap(), Lookup::Missing);
}

pub async fn concurrent_inserts_create_once(store: Arc<dyn UrlStore>, tasks: usize) {
    let mut handles = Vec::with_capacity(tasks);
    for i in 0..tasks {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let candidate = format!("race{:04}", i);
            store.insert(&candidate, URL_A, Some("u1")).await
        }));
    }

    let mut results = Vec::with_capacity(tasks);
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    let created = results.iter().filter(|r| r.is_created()).count();
    assert_eq!(created, 1, "exactly one insert must create the record");

    let keys: HashSet<&str> = results.iter().map(|r| r.short_key.as_str()).collect();
    assert_eq!(keys.len(), 1, "all callers must see the same key");

    let stats = store.count().await.unwrap();
    assert_eq!(stats.urls, 1);
}

pub async fn read_reports_all_states(store: Arc<dyn UrlStore>) {
    store.insert("key00001", URL_A, Some("u1")).await.unwrap();

    let active = store.read("key00001").await.unwrap();
    assert_eq!(active, Lookup::Active(URL_A.to_string()));
    assert!(active.found());
    assert!(!active.is_deleted());

    store
        .soft_delete_batch("u1", &keys(&["key00001"]))
        .await
        .unwrap();
    let deleted = store.read("key00001").await.unwrap();
    assert!(deleted.found());
    assert!(deleted.is_deleted());
    assert_eq!(deleted.original_url(), Some(URL_A));

    assert_eq!(store.read("nosuchkey").await.unwrap(), Lookup::Missing);
}

pub async fn deleted_url_can_be_shortened_again(store: Arc<dyn UrlStore>) {
    store.insert("key00001", URL_A, Some("u1")).await.unwrap();
    store
        .soft_delete_batch("u1", &keys(&["key00001"]))
        .await
        .unwrap();

    let again = store.insert("key00002", URL_A, Some("u2")).await.unwrap();
    assert_eq!(again.outcome, InsertOutcome::Created);
    assert_eq!(again.short_key, "key00002");

    // 旧记录保持删除状态
    assert!(store.read("key00001").await.unwrap().is_deleted());
    assert_eq!(
        store.read("key00002").await.unwrap(),
        Lookup::Active(URL_A.to_string())
    );
}

pub async fn short_keys_are_never_reused(store: Arc<dyn UrlStore>) {
    store.insert("key00001", URL_A, Some("u1")).await.unwrap();

    let err = store.insert("key00001", URL_B, Some("u1")).await.unwrap_err();
    assert!(matches!(err, LinkvaultError::KeyCollision(_)));

    store
        .soft_delete_batch("u1", &keys(&["key00001"]))
        .await
        .unwrap();
    let err = store.insert("key00001", URL_B, Some("u1")).await.unwrap_err();
    assert!(matches!(err, LinkvaultError::KeyCollision(_)));
}

pub async fn delete_respects_ownership(store: Arc<dyn UrlStore>) {
    store.insert("key00001", URL_A, Some("u1")).await.unwrap();
    store.insert("key00002", URL_B, Some("u2")).await.unwrap();
    store.insert("key00003", URL_C, None).await.unwrap();

    store
        .soft_delete_batch("u1", &keys(&["key00001", "key00002", "key00003", "missing1"]))
        .await
        .unwrap();

    assert!(store.read("key00001").await.unwrap().is_deleted());
    assert!(!store.read("key00002").await.unwrap().is_deleted());
    assert!(!store.read("key00003").await.unwrap().is_deleted());
}

pub async fn delete_is_idempotent(store: Arc<dyn UrlStore>) {
    store.insert("key00001", URL_A, Some("u1")).await.unwrap();

    let batch = keys(&["key00001", "key00001"]);
    store.soft_delete_batch("u1", &batch).await.unwrap();
    store.soft_delete_batch("u1", &batch).await.unwrap();
    store.soft_delete_batch("u1", &[]).await.unwrap();

    assert!(store.read("key00001").await.unwrap().is_deleted());
}

pub async fn read_all_by_owner_lists_active_links(store: Arc<dyn UrlStore>) {
    store.insert("key00001", URL_A, Some("u1")).await.unwrap();
    store.insert("key00002", URL_B, Some("u1")).await.unwrap();
    store.insert("key00003", URL_C, Some("u2")).await.unwrap();
    store.insert("key00004", URL_D, Some("u1")).await.unwrap();
    store
        .soft_delete_batch("u1", &keys(&["key00004"]))
        .await
        .unwrap();

    let mut owned = store.read_all_by_owner("u1").await.unwrap();
    owned.sort_by(|a, b| a.short_key.cmp(&b.short_key));

    let pairs: Vec<(&str, &str)> = owned
        .iter()
        .map(|o| (o.short_key.as_str(), o.original_url.as_str()))
        .collect();
    assert_eq!(pairs, vec![("key00001", URL_A), ("key00002", URL_B)]);

    assert!(store.read_all_by_owner("nobody").await.unwrap().is_empty());
}

pub async fn count_tracks_active_records(store: Arc<dyn UrlStore>) {
    assert_eq!(store.count().await.unwrap(), StoreStats::default());

    store.insert("key00001", URL_A, Some("u1")).await.unwrap();
    store.insert("key00002", URL_B, Some("u1")).await.unwrap();
    store.insert("key00003", URL_C, Some("u2")).await.unwrap();
    store.insert("key00004", URL_D, None).await.unwrap();
    assert_eq!(
        store.count().await.unwrap(),
        StoreStats { urls: 4, owners: 2 }
    );

    store
        .soft_delete_batch("u2", &keys(&["key00003"]))
        .await
        .unwrap();
    assert_eq!(
        store.count().await.unwrap(),
        StoreStats { urls: 3, owners: 1 }
    );
}

pub async fn ping_succeeds(store: Arc<dyn UrlStore>) {
    store.ping().await.unwrap();
    assert!(!store.backend_name().is_empty());
}

pub async fn invalid_candidate_keys_are_rejected(store: Arc<dyn UrlStore>) {
    let too_long = "k".repeat(33);
    for key in ["my-key", "", "key 0001", "ключ0001", too_long.as_str()] {
        let err = store.insert(key, URL_A, Some("u1")).await.unwrap_err();
        assert!(
            matches!(err, LinkvaultError::Validation(_)),
            "key {:?} should be rejected, got {:?}",
            key,
            err
        );
    }
    assert_eq!(store.count().await.unwrap(), StoreStats::default());

    // 最长合法短码可以写入并读回
    let longest = "k".repeat(32);
    let inserted = store.insert(&longest, URL_A, Some("u1")).await.unwrap();
    assert_eq!(inserted.outcome, InsertOutcome::Created);
    assert_eq!(
        store.read(&longest).await.unwrap(),
        Lookup::Active(URL_A.to_string())
    );
}

pub async fn long_urls_sharing_a_prefix_are_distinct(store: Arc<dyn UrlStore>) {
    let prefix = format!("https://example.com/{}", "p".repeat(300));
    let first_url = format!("{}/a", prefix);
    let second_url = format!("{}/b", prefix);

    let first = store.insert("long0001", &first_url, Some("u1")).await.unwrap();
    let second = store.insert("long0002", &second_url, Some("u1")).await.unwrap();
    assert_eq!(first.outcome, InsertOutcome::Created);
    assert_eq!(second.outcome, InsertOutcome::Created);

    // 删除后同一个长 URL 可以重新缩短
    store
        .soft_delete_batch("u1", &keys(&["long0001"]))
        .await
        .unwrap();
    let again = store.insert("long0003", &first_url, Some("u2")).await.unwrap();
    assert_eq!(again.outcome, InsertOutcome::Created);
    assert_eq!(again.short_key, "long0003");
}
