/// Content strategies for cached artifacts.
pub mod contents;
/// The bounded LRU file cache.
pub mod fcache;
/// Background freshness monitoring.
pub mod monitor;
