#![allow(clippy::unwrap_used, missing_docs)]

mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::test_settings;

use burrow::cache::contents::{GeneratedContents, content_factory};
use burrow::cache::fcache::FileCache;

fn cache_with_capacity(root: &std::path::Path, capacity: usize) -> FileCache {
    let settings = Arc::new(test_settings(root));
    FileCache::new(capacity, content_factory(settings))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_returns_file_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("file.txt"), b"hello gopher").unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);

    let bytes = cache.fetch(&tmp.path().join("file.txt")).await.unwrap();

    assert_eq!(&bytes[..], b"hello gopher");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_missing_path_is_not_found_and_inserts_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);

    let err = cache.fetch(&tmp.path().join("ghost.txt")).await.unwrap_err();

    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    assert!(cache.is_empty().await, "a failed load must not be cached");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn membership_never_exceeds_capacity() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = cache_with_capacity(tmp.path(), 2);

    for name in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"] {
        let path = tmp.path().join(name);
        std::fs::write(&path, name).unwrap();
        cache.fetch(&path).await.unwrap();
        assert!(
            cache.len().await <= 2,
            "capacity bound violated after fetching {name}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lru_eviction_keeps_recently_served_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.txt");
    let b = tmp.path().join("b.txt");
    let c = tmp.path().join("c.txt");
    for path in [&a, &b, &c] {
        std::fs::write(path, b"x").unwrap();
    }
    let cache = cache_with_capacity(tmp.path(), 2);

    // A, B, A, C: re-serving A makes B the eviction candidate.
    cache.fetch(&a).await.unwrap();
    cache.fetch(&b).await.unwrap();
    cache.fetch(&a).await.unwrap();
    cache.fetch(&c).await.unwrap();

    assert!(cache.contains(&a).await, "A was re-served before C came in");
    assert!(cache.contains(&c).await, "C was just served");
    assert!(!cache.contains(&b).await, "B was least recently used");
    assert_eq!(cache.len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fresh_entry_is_served_without_rereading_the_source() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("file.txt");
    std::fs::write(&path, b"original").unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);

    cache.fetch(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    // Still fresh, so the vanished source must not matter.
    let bytes = cache.fetch(&path).await.unwrap();
    assert_eq!(&bytes[..], b"original");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalidated_entry_reloads_on_next_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("file.txt");
    std::fs::write(&path, b"v1").unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);

    assert_eq!(&cache.fetch(&path).await.unwrap()[..], b"v1");

    std::fs::write(&path, b"v2").unwrap();
    assert!(cache.invalidate(&path).await);

    assert_eq!(&cache.fetch(&path).await.unwrap()[..], b"v2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalidate_unknown_path_is_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);

    assert!(!cache.invalidate(&tmp.path().join("nope")).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_reload_surfaces_the_error_and_keeps_the_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("file.txt");
    std::fs::write(&path, b"v1").unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);

    cache.fetch(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();
    cache.invalidate(&path).await;

    let err = cache.fetch(&path).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(cache.contains(&path).await, "the stale entry stays cached");

    // Once the source reappears, the same entry recovers.
    std::fs::write(&path, b"v2").unwrap();
    assert_eq!(&cache.fetch(&path).await.unwrap()[..], b"v2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn installed_generated_entry_is_served_from_memory() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = cache_with_capacity(tmp.path(), 4);
    let path = tmp.path().join("made-up.txt");

    cache
        .install(
            &path,
            Box::new(GeneratedContents::new(Bytes::from_static(b"synthetic"))),
        )
        .await
        .unwrap();

    assert_eq!(&cache.fetch(&path).await.unwrap()[..], b"synthetic");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn evicted_entry_reloads_from_disk_on_refetch() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.txt");
    let b = tmp.path().join("b.txt");
    std::fs::write(&a, b"a-v1").unwrap();
    std::fs::write(&b, b"b").unwrap();
    let cache = cache_with_capacity(tmp.path(), 1);

    cache.fetch(&a).await.unwrap();
    cache.fetch(&b).await.unwrap();
    assert!(!cache.contains(&a).await, "capacity 1 evicts A on B's insert");

    std::fs::write(&a, b"a-v2").unwrap();
    assert_eq!(&cache.fetch(&a).await.unwrap()[..], b"a-v2");
}
