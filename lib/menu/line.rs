//! Menu line builders.
//!
//! A menu line has the shape `T<display>\t<selector>\t<host>\t<port>\r\n`
//! where `T` is a single type byte. Everything here is a pure function of its
//! inputs plus the advertised host and port from [`Settings`].

use std::path::Path;

use bytes::{Bytes, BytesMut};

use crate::settings::Settings;

/// Line terminator for every menu line.
pub const CRLF: &str = "\r\n";

/// The protocol terminator appended after a complete menu.
pub const LAST_LINE: &[u8] = b".\r\n";

/// Placeholder token replaced by the configured hostname in typed menu lines.
pub const HOSTNAME_PLACEHOLDER: &str = "$hostname";

/// Type bytes that mark a line as a pre-formed menu item. Anything else is
/// wrapped as an info line.
const MENU_TYPE_BYTES: &[u8] = b"0123456789+gIThis";

/// Classification of a directory entry into a menu type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// `0` — plain text file.
    Text,
    /// `1` — directory / submenu.
    Menu,
    /// `3` — error line.
    Error,
    /// `9` — opaque binary file.
    Binary,
    /// `g` — GIF image.
    Gif,
    /// `I` — other image.
    Image,
    /// `h` — HTML document.
    Html,
    /// `i` — informational text.
    Info,
    /// `s` — sound file.
    Sound,
}

impl ItemType {
    /// The wire type byte for this item.
    #[must_use]
    pub fn byte(self) -> char {
        match self {
            Self::Text => '0',
            Self::Menu => '1',
            Self::Error => '3',
            Self::Binary => '9',
            Self::Gif => 'g',
            Self::Image => 'I',
            Self::Html => 'h',
            Self::Info => 'i',
            Self::Sound => 's',
        }
    }

    /// Classify a file by its name. Directories are classified by the caller
    /// from metadata; this covers the extension policy for regular files.
    #[must_use]
    pub fn for_file_name(name: &Path) -> Self {
        let ext = name
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt" | "md" | "log" | "conf") => Self::Text,
            Some("gif") => Self::Gif,
            Some("png" | "jpg" | "jpeg" | "bmp" | "webp") => Self::Image,
            Some("html" | "htm") => Self::Html,
            Some("wav" | "mp3" | "ogg" | "flac") => Self::Sound,
            _ => Self::Binary,
        }
    }
}

/// True if `byte` is a recognized menu type byte, i.e. a gophermap line
/// starting with it is passed through as a pre-formed menu item.
#[must_use]
pub fn is_menu_type(byte: u8) -> bool {
    MENU_TYPE_BYTES.contains(&byte)
}

/// Build one menu line pointing at `selector`, advertised at the configured
/// host and port.
#[must_use]
pub fn build_line(item: ItemType, display: &str, selector: &str, settings: &Settings) -> Bytes {
    Bytes::from(format!(
        "{}{display}\t{selector}\t{}\t{}{CRLF}",
        item.byte(),
        settings.hostname,
        settings.port,
    ))
}

/// Build an info line: type `i`, selector `-`.
#[must_use]
pub fn build_info_line(text: &str, settings: &Settings) -> Bytes {
    build_line(ItemType::Info, text, "-", settings)
}

/// Build an error line: type `3`, selector `-`.
#[must_use]
pub fn build_error_line(text: &str, settings: &Settings) -> Bytes {
    build_line(ItemType::Error, text, "-", settings)
}

/// Replace every `$hostname` occurrence with the configured hostname.
#[must_use]
pub fn substitute_hostname(line: &str, settings: &Settings) -> String {
    line.replace(HOSTNAME_PLACEHOLDER, &settings.hostname)
}

/// Reflow Unix-newline text into consecutive info lines of at most
/// `page_width` bytes each, ending on CR-LF.
#[must_use]
pub fn reflow_into_info_lines(text: &[u8], settings: &Settings) -> Bytes {
    let mut out = BytesMut::new();
    let mut segments = text.split(|&b| b == b'\n').peekable();
    while let Some(raw) = segments.next() {
        // A trailing newline leaves one empty segment, not an empty line.
        if raw.is_empty() && segments.peek().is_none() {
            break;
        }
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            out.extend_from_slice(&build_info_line("", settings));
            continue;
        }
        let line = String::from_utf8_lossy(raw);
        let mut rest = line.as_ref();
        while !rest.is_empty() {
            let take = slice_width(rest, settings.page_width);
            out.extend_from_slice(&build_info_line(&rest[..take], settings));
            rest = &rest[take..];
        }
    }
    if !out.ends_with(CRLF.as_bytes()) {
        out.extend_from_slice(CRLF.as_bytes());
    }
    out.freeze()
}

/// Largest prefix length of `s` that is at most `width` bytes and falls on a
/// character boundary.
fn slice_width(s: &str, width: usize) -> usize {
    if s.len() <= width {
        return s.len();
    }
    let mut end = width;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    // A single character wider than the page still has to go somewhere.
    if end == 0 {
        end = s.chars().next().map_or(s.len(), char::len_utf8);
    }
    end
}
