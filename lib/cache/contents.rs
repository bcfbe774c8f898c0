//! Content strategies.
//!
//! Every cached artifact hides its representation behind [`FileContents`]:
//! raw bytes for regular files, a parsed section list for gophermaps (so
//! embedded directives re-execute on every render), and a pre-computed
//! buffer for generated policy files. The cache calls `load` under the
//! entry's write lock, `render` under its read lock, and `clear` on
//! eviction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{self, BoxFuture, FutureExt as _};

use crate::error::FileError;
use crate::io;
use crate::menu::gophermap::{self, Section};
use crate::policy;
use crate::settings::Settings;

/// The capability set of a cached artifact's contents.
pub trait FileContents: Send + Sync {
    /// Read or re-read contents from the source.
    fn load(&mut self) -> BoxFuture<'_, Result<(), FileError>>;

    /// Render the loaded contents to the bytes served to clients.
    fn render(&self) -> BoxFuture<'_, Bytes>;

    /// Drop loaded contents. Called when the entry is evicted.
    fn clear(&mut self);
}

/// Builds the content strategy for a path on a cache miss.
pub type ContentFactory = Box<dyn Fn(&Path) -> Box<dyn FileContents> + Send + Sync>;

/// The server's path → strategy policy: canonical policy paths are rebuilt
/// from settings, gophermap sources parse into sections, everything else
/// loads raw bytes. Recognizing the policy paths here means an evicted
/// generated entry is regenerated on its next fetch instead of failing a
/// disk read.
#[must_use]
pub fn content_factory(settings: Arc<Settings>) -> ContentFactory {
    Box::new(move |path: &Path| -> Box<dyn FileContents> {
        if path == settings.caps_txt_path() {
            Box::new(GeneratedContents::new(policy::generate_caps_txt(&settings)))
        } else if path == settings.robots_txt_path() {
            Box::new(GeneratedContents::new(policy::generate_robots_txt()))
        } else if gophermap::is_gophermap(path) {
            Box::new(GophermapContents::new(path, Arc::clone(&settings)))
        } else {
            Box::new(RegularContents::new(path))
        }
    })
}

/// Opaque file contents: the raw bytes of the source file.
pub struct RegularContents {
    path: PathBuf,
    buf: Bytes,
}

impl RegularContents {
    /// An empty strategy for the file at `path`; nothing is read until the
    /// first `load`.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            buf: Bytes::new(),
        }
    }
}

impl FileContents for RegularContents {
    fn load(&mut self) -> BoxFuture<'_, Result<(), FileError>> {
        async move {
            self.buf = Bytes::from(io::read_file(&self.path).await?);
            Ok(())
        }
        .boxed()
    }

    fn render(&self) -> BoxFuture<'_, Bytes> {
        future::ready(self.buf.clone()).boxed()
    }

    fn clear(&mut self) {
        self.buf = Bytes::new();
    }
}

/// Gophermap contents: the parsed section list of the source, rendered by
/// re-executing each section on request.
pub struct GophermapContents {
    path: PathBuf,
    settings: Arc<Settings>,
    sections: Vec<Section>,
}

impl GophermapContents {
    /// An unparsed strategy for the gophermap at `path`.
    #[must_use]
    pub fn new(path: &Path, settings: Arc<Settings>) -> Self {
        Self {
            path: path.to_path_buf(),
            settings,
            sections: Vec::new(),
        }
    }
}

impl FileContents for GophermapContents {
    fn load(&mut self) -> BoxFuture<'_, Result<(), FileError>> {
        async move {
            self.sections = gophermap::parse(&self.path, &self.settings).await?;
            Ok(())
        }
        .boxed()
    }

    fn render(&self) -> BoxFuture<'_, Bytes> {
        async move { gophermap::render_sections(&self.sections, &self.settings).await }.boxed()
    }

    fn clear(&mut self) {
        self.sections = Vec::new();
    }
}

/// In-memory contents generated at startup. Has no on-disk source, so it
/// never becomes stale: `load` succeeds without touching anything and
/// `clear` keeps the buffer.
pub struct GeneratedContents {
    buf: Bytes,
}

impl GeneratedContents {
    /// Wrap a pre-computed buffer.
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }
}

impl FileContents for GeneratedContents {
    fn load(&mut self) -> BoxFuture<'_, Result<(), FileError>> {
        future::ready(Ok(())).boxed()
    }

    fn render(&self) -> BoxFuture<'_, Bytes> {
        future::ready(self.buf.clone()).boxed()
    }

    fn clear(&mut self) {}
}
