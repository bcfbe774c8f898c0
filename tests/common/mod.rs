#![allow(dead_code, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;

use burrow::cache::contents::{ContentFactory, FileContents, content_factory};
use burrow::error::FileError;
use burrow::settings::Settings;

/// Settings rooted at a test directory, with a short monitor interval.
pub fn test_settings(root: &Path) -> Settings {
    Settings {
        hostname: "example.org".to_owned(),
        port: 70,
        root: root.to_path_buf(),
        page_width: 80,
        cache_capacity: 4,
        monitor_interval: Duration::from_millis(25),
        description: "Test server".to_owned(),
        admin_email: "admin@example.org".to_owned(),
        geolocation: "Testland".to_owned(),
    }
}

/// Write `lines` to `path`, each CR-LF terminated.
pub fn write_crlf(path: &Path, lines: &[&str]) {
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push_str("\r\n");
    }
    std::fs::write(path, text).unwrap();
}

/// Wraps a real content strategy and counts every delegate load, so tests
/// can assert how often the cache actually hit the source.
pub struct TrackedContents {
    inner: Box<dyn FileContents>,
    loads: Arc<AtomicUsize>,
}

impl FileContents for TrackedContents {
    fn load(&mut self) -> BoxFuture<'_, Result<(), FileError>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load()
    }

    fn render(&self) -> BoxFuture<'_, Bytes> {
        self.inner.render()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

/// The server's content factory with a load counter threaded through every
/// strategy it builds.
pub fn tracked_factory(settings: Arc<Settings>, loads: Arc<AtomicUsize>) -> ContentFactory {
    let inner = content_factory(settings);
    Box::new(move |path| -> Box<dyn FileContents> {
        Box::new(TrackedContents {
            inner: inner(path),
            loads: Arc::clone(&loads),
        })
    })
}
