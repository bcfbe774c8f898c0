//! Random IO utilities.

use std::path::Path;

use crate::error::FileError;

/// Read a whole file, mapping the not-found cause into [`FileError::NotFound`].
pub async fn read_file(path: &Path) -> Result<Vec<u8>, FileError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| FileError::from_io(path, e))
}

/// The on-disk modification time of `path` in nanoseconds since the epoch.
///
/// Times before the epoch clamp to zero, which is older than any refresh
/// timestamp this process will ever record.
pub async fn mtime_nanos(path: &Path) -> Result<u128, FileError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;
    let mtime = meta.modified().map_err(|e| FileError::from_io(path, e))?;
    Ok(mtime
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos()))
}

/// The current wall clock in nanoseconds since the epoch.
#[must_use]
pub fn now_nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos())
}
