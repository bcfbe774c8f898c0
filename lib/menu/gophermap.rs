//! Gophermap parsing and section rendering.
//!
//! A gophermap source is scanned line by line (strict CR-LF delimiters) and
//! classified by its leading byte into an ordered list of [`Section`]s:
//! static text that renders as-is, and a deferred directory listing that
//! re-enumerates the filesystem on every render. Included submaps are parsed
//! recursively and spliced into the parent's section list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::FileError;
use crate::io;
use crate::menu::line::{self, CRLF};
use crate::menu::listing;
use crate::settings::Settings;

/// File-name suffix marking a gophermap source. Covers both a bare
/// `gophermap` directory index and `<name>.gophermap` submaps.
pub const GOPHERMAP_SUFFIX: &str = "gophermap";

/// Info-line text substituted for a section whose render failed.
pub const RENDER_ERROR_TEXT: &str = "Error rendering gophermap section";

/// True if `path` names a gophermap source.
#[must_use]
pub fn is_gophermap(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(GOPHERMAP_SUFFIX))
}

/// One independently renderable unit of a parsed gophermap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Pre-rendered menu text, emitted verbatim.
    Static(Bytes),

    /// A deferred directory listing, enumerated on every render. At most one
    /// per gophermap, always last.
    DirListing {
        /// Directory to enumerate.
        dir: PathBuf,
        /// Base names suppressed by `-` directives.
        hidden: HashSet<String>,
    },
}

impl Section {
    /// Render this section to menu bytes.
    pub async fn render(&self, settings: &Settings) -> Result<Bytes, FileError> {
        match self {
            Self::Static(bytes) => Ok(bytes.clone()),
            Self::DirListing { dir, hidden } => listing::list_dir(dir, hidden, settings).await,
        }
    }
}

/// Render a section list by concatenation. A failing section is replaced in
/// place by a single error info line; the overall render never fails.
pub async fn render_sections(sections: &[Section], settings: &Settings) -> Bytes {
    let mut out = BytesMut::new();
    for section in sections {
        match section.render(settings).await {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(e) => {
                warn!(error = %e, "gophermap section failed to render");
                out.extend_from_slice(&line::build_info_line(RENDER_ERROR_TEXT, settings));
            }
        }
    }
    out.freeze()
}

/// Parse the gophermap at `path` into its section list.
pub async fn parse(path: &Path, settings: &Settings) -> Result<Vec<Section>, FileError> {
    let mut visited = HashSet::new();
    parse_guarded(path, settings, &mut visited).await
}

/// Recursive worker behind [`parse`]. `visited` holds every gophermap on the
/// current include chain so multi-file cycles terminate like the single-file
/// self-reference does.
fn parse_guarded<'a>(
    path: &'a Path,
    settings: &'a Settings,
    visited: &'a mut HashSet<PathBuf>,
) -> BoxFuture<'a, Result<Vec<Section>, FileError>> {
    Box::pin(async move {
        visited.insert(path.to_path_buf());
        let data = io::read_file(path).await?;

        let mut sections = Vec::new();
        let mut hidden: HashSet<String> = HashSet::new();
        let mut want_listing = false;

        for raw in CrlfLines::new(&data) {
            let text = String::from_utf8_lossy(raw);
            match classify(&text) {
                LineKind::Comment => {}
                LineKind::Hidden(name) => {
                    hidden.insert(name.to_owned());
                }
                LineKind::Include(target) => {
                    include_target(target, path, settings, visited, &mut sections).await;
                }
                LineKind::Exec => {
                    sections.push(Section::Static(line::build_info_line(
                        "Error: inline shell commands not supported",
                        settings,
                    )));
                }
                LineKind::End => break,
                LineKind::EndWithListing => {
                    want_listing = true;
                    break;
                }
                LineKind::MenuItem => {
                    let substituted = line::substitute_hostname(&text, settings);
                    sections.push(Section::Static(Bytes::from(substituted + CRLF)));
                }
                LineKind::PlainText => {
                    sections.push(Section::Static(line::build_info_line(&text, settings)));
                }
            }
        }

        // The `*` directive always comes last in the map, so the hidden set
        // is complete by the time the listing is constructed.
        if want_listing {
            let dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();
            sections.push(Section::DirListing { dir, hidden });
        }

        // Only the current include chain guards recursion; a submap spliced
        // twice in sequence is legitimate.
        visited.remove(path);
        Ok(sections)
    })
}

/// What a scanned gophermap line means.
enum LineKind<'a> {
    Comment,
    Hidden(&'a str),
    Include(&'a str),
    Exec,
    End,
    EndWithListing,
    MenuItem,
    PlainText,
}

fn classify(text: &str) -> LineKind<'_> {
    let Some(&first) = text.as_bytes().first() else {
        return LineKind::PlainText;
    };
    match first {
        b'#' => LineKind::Comment,
        b'-' => LineKind::Hidden(&text[1..]),
        b'=' => LineKind::Include(&text[1..]),
        b'$' => LineKind::Exec,
        b'.' if text.len() == 1 => LineKind::End,
        b'*' if text.len() == 1 => LineKind::EndWithListing,
        b if line::is_menu_type(b) => LineKind::MenuItem,
        _ => LineKind::PlainText,
    }
}

/// Handle one `=` include directive: splice a submap, or inject a regular
/// file reflowed into info lines. Failures degrade to a single error info
/// line so the rest of the map still renders.
async fn include_target(
    target: &str,
    current: &Path,
    settings: &Settings,
    visited: &mut HashSet<PathBuf>,
    sections: &mut Vec<Section>,
) {
    let resolved = resolve_target(target, current, settings);
    if is_gophermap(&resolved) {
        if visited.contains(&resolved) {
            // Self-reference or a longer include cycle. Recursion bad.
            debug!(submap = target, "skipping cyclic gophermap include");
            return;
        }
        match parse_guarded(&resolved, settings, visited).await {
            Ok(sub) => sections.extend(sub),
            Err(e) => {
                debug!(submap = target, error = %e, "failed to read subgophermap");
                sections.push(Section::Static(line::build_info_line(
                    &format!("Error reading subgophermap: {target}"),
                    settings,
                )));
            }
        }
    } else {
        match io::read_file(&resolved).await {
            Ok(data) => sections.push(Section::Static(line::reflow_into_info_lines(
                &data, settings,
            ))),
            Err(e) => {
                debug!(include = target, error = %e, "failed to read included file");
                sections.push(Section::Static(line::build_info_line(
                    &format!("Error reading subgophermap: {target}"),
                    settings,
                )));
            }
        }
    }
}

/// Resolve an include target: absolute targets are rooted at the server
/// root, relative ones at the including gophermap's directory.
fn resolve_target(target: &str, current: &Path, settings: &Settings) -> PathBuf {
    if let Some(stripped) = target.strip_prefix('/') {
        settings.root.join(stripped)
    } else {
        current
            .parent()
            .unwrap_or(Path::new("/"))
            .join(target)
    }
}

/// Iterator over strictly CR-LF-terminated lines. A trailing fragment with
/// no terminator is not yielded.
struct CrlfLines<'a> {
    data: &'a [u8],
}

impl<'a> CrlfLines<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for CrlfLines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let pos = self
            .data
            .windows(2)
            .position(|w| w == b"\r\n")?;
        let line = &self.data[..pos];
        self.data = &self.data[pos + 2..];
        Some(line)
    }
}
