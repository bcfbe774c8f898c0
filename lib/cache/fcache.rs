//! Path-keyed, MT-safe, bounded LRU file cache.
//!
//! The cache coordinates many concurrent readers against lazy reloads: each
//! entry carries a fresh flag flipped asynchronously by the freshness
//! monitor, and the next fetch of a stale entry reloads it on the serving
//! task. Membership is bounded by LRU eviction.
//!
//! Lock order is map lock → entry lock → recency lock, never reversed; the
//! recency lock is never held while acquiring another lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use hashlink::LinkedHashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::contents::{ContentFactory, FileContents};
use crate::error::FileError;
use crate::io;

/// An entry's contents and freshness bookkeeping. Only ever touched behind
/// the owning [`CachedFile`]'s read/write lock, so a reader always observes
/// a consistent (contents, fresh) pair.
pub struct FileState {
    contents: Box<dyn FileContents>,
    fresh: bool,
    last_refresh: u128,
}

impl FileState {
    fn new(contents: Box<dyn FileContents>) -> Self {
        Self {
            contents,
            fresh: false,
            last_refresh: 0,
        }
    }

    /// Reload from the source. On success the entry becomes fresh and the
    /// refresh timestamp advances to the current wall clock.
    async fn load(&mut self) -> Result<(), FileError> {
        self.contents.load().await?;
        self.fresh = true;
        self.last_refresh = io::now_nanos();
        Ok(())
    }

    async fn render(&self) -> Bytes {
        self.contents.render().await
    }

    /// Whether the loaded contents are known to be up to date.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Wall-clock nanoseconds of the last successful load.
    #[must_use]
    pub fn last_refresh(&self) -> u128 {
        self.last_refresh
    }

    /// Mark the contents out of date without touching them. The next fetch
    /// reloads.
    pub fn set_unfresh(&mut self) {
        self.fresh = false;
    }
}

/// A cached artifact behind its per-entry read/write lock.
pub struct CachedFile {
    state: RwLock<FileState>,
}

impl CachedFile {
    fn new(state: FileState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

/// A bounded LRU cache from absolute path to [`CachedFile`].
///
/// The path set of the map and of the recency list are equal at every point
/// observable outside the map-write critical section, and never exceed the
/// capacity after a fetch returns.
pub struct FileCache {
    /// Membership. The read side is shared by fetches and the monitor sweep;
    /// the write side is taken only to insert or evict.
    map: RwLock<HashMap<PathBuf, Arc<CachedFile>>>,

    /// Recency order over the same path set. Back is most recently served,
    /// front is the eviction candidate.
    recency: Mutex<LinkedHashMap<PathBuf, ()>>,

    /// Maximum number of entries after any fetch.
    capacity: usize,

    /// Builds the content strategy for a path on a miss.
    factory: ContentFactory,
}

impl FileCache {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; a cache that evicts what it just
    /// inserted cannot serve anything.
    #[must_use]
    pub fn new(capacity: usize, factory: ContentFactory) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            map: RwLock::new(HashMap::new()),
            recency: Mutex::new(LinkedHashMap::new()),
            capacity,
            factory,
        }
    }

    /// Fetch the rendered bytes for `path`, loading, reloading, inserting,
    /// and evicting as required.
    ///
    /// Concurrent fetches of distinct fresh entries proceed in parallel;
    /// concurrent fetches of one stale entry reload it at most once in
    /// aggregate; the served path becomes the most recently used.
    pub async fn fetch(&self, path: &Path) -> Result<Bytes, FileError> {
        let map = self.map.read().await;
        if let Some(entry) = map.get(path) {
            let entry = Arc::clone(entry);
            let bytes = Self::read_entry(&entry).await?;
            self.touch(path).await;
            drop(map);
            return Ok(bytes);
        }

        // Miss. Swap the map read lock for the write lock and re-check;
        // another task may have inserted while we waited.
        drop(map);
        let mut map = self.map.write().await;
        if !map.contains_key(path) {
            let mut state = FileState::new((self.factory)(path));
            // Not yet published, so the initial load needs no entry lock.
            state.load().await?;
            let entry = Arc::new(CachedFile::new(state));
            map.insert(path.to_path_buf(), entry);
            {
                let mut recency = self.recency.lock().await;
                recency.insert(path.to_path_buf(), ());
            }
            if map.len() > self.capacity {
                self.evict_lru(&mut map).await;
            }
        }

        let map = map.downgrade();
        let entry = map.get(path).map(Arc::clone).unwrap_or_else(|| {
            unreachable!("entry published under the map write lock has vanished")
        });
        let bytes = Self::read_entry(&entry).await?;
        self.touch(path).await;
        drop(map);
        Ok(bytes)
    }

    /// Mark `path` stale so its next fetch reloads from the source. Returns
    /// false if the path is not cached.
    pub async fn invalidate(&self, path: &Path) -> bool {
        let map = self.map.read().await;
        if let Some(entry) = map.get(path) {
            entry.state.write().await.set_unfresh();
            true
        } else {
            false
        }
    }

    /// Load `contents` and publish it at `path`. Used by the policy
    /// bootstrap before any concurrent activity begins; the capacity bound
    /// applies like everywhere else.
    pub async fn install(
        &self,
        path: &Path,
        contents: Box<dyn FileContents>,
    ) -> Result<(), FileError> {
        let mut state = FileState::new(contents);
        state.load().await?;
        let entry = Arc::new(CachedFile::new(state));
        let mut map = self.map.write().await;
        map.insert(path.to_path_buf(), entry);
        {
            let mut recency = self.recency.lock().await;
            recency.remove(path);
            recency.insert(path.to_path_buf(), ());
        }
        if map.len() > self.capacity {
            self.evict_lru(&mut map).await;
        }
        Ok(())
    }

    /// One freshness sweep: compare every entry's on-disk mtime against its
    /// last refresh and mark entries with a strictly newer source stale.
    /// Never evicts or reloads; the next fetch of a flipped entry does the
    /// work.
    pub async fn sweep_freshness(&self) {
        let map = self.map.read().await;
        for (path, entry) in map.iter() {
            let mtime = match io::mtime_nanos(path).await {
                Ok(mtime) => mtime,
                Err(e) => {
                    // Generated entries have no source, and a missing file
                    // may reappear. Keep the entry either way.
                    debug!(path = %path.display(), error = %e, "failed to stat cached file");
                    continue;
                }
            };
            let mut state = entry.state.write().await;
            if state.is_fresh() && mtime > state.last_refresh() {
                debug!(path = %path.display(), "source newer on disk, marking stale");
                state.set_unfresh();
            }
        }
    }

    /// Whether `path` currently has a cache entry.
    pub async fn contains(&self, path: &Path) -> bool {
        self.map.read().await.contains_key(path)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    /// True if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }

    /// Render an entry, reloading first if it is stale. Readers of a fresh
    /// entry share its read lock; a stale entry swaps to the write lock,
    /// re-checks freshness (another task may have reloaded in the window),
    /// loads if still needed, and downgrades for the render.
    async fn read_entry(entry: &CachedFile) -> Result<Bytes, FileError> {
        let state = entry.state.read().await;
        if state.is_fresh() {
            return Ok(state.render().await);
        }
        drop(state);

        let mut state = entry.state.write().await;
        if !state.is_fresh() {
            state.load().await?;
        }
        let state = state.downgrade();
        Ok(state.render().await)
    }

    /// Move `path` to the most-recently-used end of the recency order.
    async fn touch(&self, path: &Path) {
        let mut recency = self.recency.lock().await;
        if recency.remove(path).is_some() {
            recency.insert(path.to_path_buf(), ());
        }
    }

    /// Remove the least recently used entry. Caller holds the map write
    /// lock. The brief acquire/release of the victim's write lock is a
    /// quiescence barrier: any reader that found the entry under an earlier
    /// map read guard has finished, and no new reader can reach it once the
    /// path leaves the map.
    async fn evict_lru(&self, map: &mut HashMap<PathBuf, Arc<CachedFile>>) {
        let victim = {
            let mut recency = self.recency.lock().await;
            recency.pop_front().map(|(path, ())| path)
        };
        let Some(victim) = victim else {
            return;
        };
        let Some(entry) = map.get(&victim).map(Arc::clone) else {
            unreachable!(
                "recency list held a path absent from the cache map: {}",
                victim.display()
            )
        };
        {
            let mut state = entry.state.write().await;
            state.contents.clear();
        }
        map.remove(&victim);
        debug!(path = %victim.display(), "evicted least recently used entry");
    }
}
