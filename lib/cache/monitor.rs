//! Background freshness monitoring.
//!
//! The monitor only ever flips fresh flags; reloading happens lazily on the
//! serving task at the next fetch. This keeps each sweep cheap (a stat and a
//! brief entry write lock per path) and never blocks readers for long: the
//! sweep holds the cache map lock on its read side only.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::cache::fcache::FileCache;

/// Spawn the freshness monitor: a task that sweeps `cache` forever, once per
/// `interval`, marking entries stale when their source is newer on disk.
///
/// The returned handle can be aborted at shutdown; the monitor holds no
/// state worth draining.
pub fn spawn_monitor(cache: Arc<FileCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval's first tick completes immediately; consume it so the
        // first sweep lands one full interval after spawn.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            trace!("freshness sweep");
            cache.sweep_freshness().await;
        }
    })
}
