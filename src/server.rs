//! The TCP boundary: selector parsing, root confinement, and response
//! framing.
//!
//! Each connection carries one request: a CR-LF-terminated selector line.
//! Menu responses (gophermaps and directory listings) get the protocol
//! terminator appended here; raw file responses are written as-is. Failures
//! degrade to a best-effort error menu rather than dropping the connection.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt as _, AsyncReadExt as _, AsyncWriteExt as _, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use burrow::cache::fcache::FileCache;
use burrow::error::FileError;
use burrow::menu::gophermap::{self, GOPHERMAP_SUFFIX};
use burrow::menu::line::{self, LAST_LINE};
use burrow::menu::listing;
use burrow::settings::Settings;

/// Upper bound on a selector line, CR-LF included.
const MAX_SELECTOR_LEN: u64 = 1024;

/// Accept connections forever, spawning one task per request.
pub async fn serve(
    listener: TcpListener,
    cache: Arc<FileCache>,
    settings: Arc<Settings>,
) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let cache = Arc::clone(&cache);
        let settings = Arc::clone(&settings);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &cache, &settings).await {
                debug!(peer = %peer, error = %e, "connection failed");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    cache: &FileCache,
    settings: &Arc<Settings>,
) -> std::io::Result<()> {
    let selector = read_selector(&mut stream).await?;
    debug!(selector, "request");
    let response = respond(&selector, cache, settings).await;
    stream.write_all(&response).await?;
    stream.shutdown().await
}

/// Read one selector line, stripped of its terminator. Anything past the
/// first tab (Gopher+ attributes, search strings) is ignored by resolution.
async fn read_selector(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut reader = BufReader::new(stream).take(MAX_SELECTOR_LEN);
    let mut buf = Vec::new();
    reader.read_until(b'\n', &mut buf).await?;
    while buf.last().is_some_and(|&b| b == b'\n' || b == b'\r') {
        buf.pop();
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn respond(selector: &str, cache: &FileCache, settings: &Arc<Settings>) -> Bytes {
    match resolve_selector(selector, settings) {
        Ok(path) => match serve_path(&path, cache, settings).await {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(selector, error = %e, "fetch failed");
                let text = if e.is_not_found() {
                    "resource does not exist"
                } else {
                    "error fetching resource"
                };
                error_menu(text, settings)
            }
        },
        Err(()) => error_menu("malformed selector", settings),
    }
}

/// Map a selector onto a path under the server root. Only plain downward
/// components are accepted; anything that would escape the root is rejected.
fn resolve_selector(selector: &str, settings: &Settings) -> Result<PathBuf, ()> {
    let sel = selector.split('\t').next().unwrap_or_default();
    let mut path = settings.root.clone();
    for comp in Path::new(sel.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return Err(()),
        }
    }
    Ok(path)
}

/// Route a resolved path: directories serve their gophermap or a generated
/// listing, gophermap sources render as menus, everything else is raw bytes.
async fn serve_path(
    path: &Path,
    cache: &FileCache,
    settings: &Arc<Settings>,
) -> Result<Bytes, FileError> {
    // Generated policy artifacts have no on-disk source; always route them
    // through the cache.
    if *path == settings.caps_txt_path() || *path == settings.robots_txt_path() {
        return cache.fetch(path).await;
    }

    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;

    if meta.is_dir() {
        let map_file = path.join(GOPHERMAP_SUFFIX);
        let menu = if tokio::fs::try_exists(&map_file)
            .await
            .map_err(|e| FileError::from_io(&map_file, e))?
        {
            cache.fetch(&map_file).await?
        } else {
            listing::list_dir(path, &HashSet::new(), settings).await?
        };
        return Ok(with_last_line(&menu));
    }

    if gophermap::is_gophermap(path) {
        return Ok(with_last_line(&cache.fetch(path).await?));
    }

    cache.fetch(path).await
}

/// Append the protocol terminator to a menu fragment.
fn with_last_line(menu: &Bytes) -> Bytes {
    let mut out = BytesMut::with_capacity(menu.len() + LAST_LINE.len());
    out.extend_from_slice(menu);
    out.extend_from_slice(LAST_LINE);
    out.freeze()
}

fn error_menu(text: &str, settings: &Settings) -> Bytes {
    with_last_line(&line::build_error_line(text, settings))
}
