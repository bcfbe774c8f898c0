#![allow(clippy::unwrap_used, missing_docs)]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{test_settings, tracked_factory};
use tokio::task::JoinSet;

use burrow::cache::contents::content_factory;
use burrow::cache::fcache::FileCache;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fetches_of_distinct_entries() {
    let tmp = tempfile::tempdir().unwrap();
    for i in 0..8 {
        std::fs::write(tmp.path().join(format!("{i}.txt")), format!("value-{i}")).unwrap();
    }
    let settings = Arc::new(test_settings(tmp.path()));
    let cache = Arc::new(FileCache::new(8, content_factory(settings)));

    let mut set = JoinSet::new();
    for i in 0..8 {
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            let path = tmp.path().join(format!("{i}.txt"));
            set.spawn(async move {
                let bytes = cache.fetch(&path).await.unwrap();
                assert_eq!(&bytes[..], format!("value-{i}").as_bytes());
            });
        }
    }
    while set.join_next().await.is_some() {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_of_one_path_load_once() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("file.txt");
    std::fs::write(&path, b"only once").unwrap();

    let settings = Arc::new(test_settings(tmp.path()));
    let loads = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(FileCache::new(
        4,
        tracked_factory(settings, Arc::clone(&loads)),
    ));

    let mut set = JoinSet::new();
    for _ in 0..32 {
        let cache = Arc::clone(&cache);
        let path = path.clone();
        set.spawn(async move {
            let bytes = cache.fetch(&path).await.unwrap();
            assert_eq!(&bytes[..], b"only once");
        });
    }
    while set.join_next().await.is_some() {}

    assert_eq!(
        loads.load(Ordering::SeqCst),
        1,
        "a racing miss must publish exactly one load"
    );
    assert_eq!(cache.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fetches_of_one_stale_entry_reload_once() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("file.txt");
    std::fs::write(&path, b"v1").unwrap();

    let settings = Arc::new(test_settings(tmp.path()));
    let loads = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(FileCache::new(
        4,
        tracked_factory(settings, Arc::clone(&loads)),
    ));

    cache.fetch(&path).await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    std::fs::write(&path, b"v2").unwrap();
    cache.invalidate(&path).await;

    let mut set = JoinSet::new();
    for _ in 0..32 {
        let cache = Arc::clone(&cache);
        let path = path.clone();
        set.spawn(async move {
            let bytes = cache.fetch(&path).await.unwrap();
            // Every racer sees the post-reload contents.
            assert_eq!(&bytes[..], b"v2");
        });
    }
    while set.join_next().await.is_some() {}

    assert_eq!(
        loads.load(Ordering::SeqCst),
        2,
        "N concurrent fetches of a stale entry must reload once in aggregate"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn capacity_bound_holds_under_a_fetch_storm() {
    let tmp = tempfile::tempdir().unwrap();
    for i in 0..20 {
        std::fs::write(tmp.path().join(format!("{i}.txt")), b"x").unwrap();
    }
    let settings = Arc::new(test_settings(tmp.path()));
    let cache = Arc::new(FileCache::new(4, content_factory(settings)));

    let mut set = JoinSet::new();
    for i in 0..20 {
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let path = tmp.path().join(format!("{i}.txt"));
            set.spawn(async move {
                cache.fetch(&path).await.unwrap();
            });
        }
    }
    while set.join_next().await.is_some() {}

    assert!(
        cache.len().await <= 4,
        "membership exceeded capacity: {}",
        cache.len().await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_share_a_fresh_entry_without_reloading() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("file.txt");
    std::fs::write(&path, b"shared").unwrap();

    let settings = Arc::new(test_settings(tmp.path()));
    let loads = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(FileCache::new(
        4,
        tracked_factory(settings, Arc::clone(&loads)),
    ));

    cache.fetch(&path).await.unwrap();

    let mut set = JoinSet::new();
    for _ in 0..64 {
        let cache = Arc::clone(&cache);
        let path = path.clone();
        set.spawn(async move {
            cache.fetch(&path).await.unwrap();
        });
    }
    while set.join_next().await.is_some() {}

    assert_eq!(
        loads.load(Ordering::SeqCst),
        1,
        "fresh reads must never touch the source"
    );
}
