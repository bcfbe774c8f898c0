//! Directory listings.
//!
//! A listing is a rendered menu fragment naming the visible children of a
//! directory: one menu line per child, display set to the base name and
//! selector set to the server-relative path.

use std::collections::HashSet;
use std::path::Path;

use bytes::{Bytes, BytesMut};

use crate::error::FileError;
use crate::menu::gophermap::GOPHERMAP_SUFFIX;
use crate::menu::line::{self, ItemType};
use crate::settings::Settings;

/// Render the visible children of `dir` as a menu fragment.
///
/// Children are emitted in lexicographic order of their base name. Dotfiles,
/// gophermap sources, and names in `hidden` are skipped. Fails with an IO
/// error if the directory cannot be enumerated.
pub async fn list_dir(
    dir: &Path,
    hidden: &HashSet<String>,
    settings: &Settings,
) -> Result<Bytes, FileError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| FileError::from_io(dir, e))?;

    let mut children: Vec<(String, bool)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FileError::from_io(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_visible(&name, hidden) {
            continue;
        }
        let is_dir = entry
            .file_type()
            .await
            .map_err(|e| FileError::from_io(&entry.path(), e))?
            .is_dir();
        children.push((name, is_dir));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = BytesMut::new();
    for (name, is_dir) in children {
        let child = dir.join(&name);
        let item = if is_dir {
            ItemType::Menu
        } else {
            ItemType::for_file_name(Path::new(&name))
        };
        let selector = settings.selector_for(&child);
        out.extend_from_slice(&line::build_line(item, &name, &selector, settings));
    }
    Ok(out.freeze())
}

/// Visibility policy for listing entries. Hidden-name directives from the
/// gophermap win over everything; dotfiles and gophermap sources are never
/// listed.
fn is_visible(name: &str, hidden: &HashSet<String>) -> bool {
    !name.starts_with('.') && !name.ends_with(GOPHERMAP_SUFFIX) && !hidden.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotfiles_and_gophermaps_are_invisible() {
        let hidden = HashSet::new();
        assert!(!is_visible(".git", &hidden));
        assert!(!is_visible("index.gophermap", &hidden));
        assert!(is_visible("file.txt", &hidden));
    }

    #[test]
    fn hidden_set_filters_names() {
        let hidden: HashSet<String> = ["secret.txt".to_owned()].into_iter().collect();
        assert!(!is_visible("secret.txt", &hidden));
        assert!(is_visible("public.txt", &hidden));
    }
}
