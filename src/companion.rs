//! # Companion Paths
//!
//! A companion is the WebP copy of a source image, stored next to it and
//! named by appending `.webp` to the full source path:
//!
//! ```text
//! uploads/2024/05/photo.jpg       (source)
//! uploads/2024/05/photo.jpg.webp  (companion)
//! ```
//!
//! Nothing records which companions exist; the relationship is recomputed
//! from the path every time it is needed.

use crate::format::has_source_extension;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Literal suffix appended to a source path
pub const COMPANION_SUFFIX: &str = ".webp";

/// `source` with `.webp` appended
pub fn companion_path(source: &Path) -> PathBuf {
    let mut path = OsString::from(source.as_os_str());
    path.push(COMPANION_SUFFIX);
    PathBuf::from(path)
}

/// Inverse of `companion_path`; `None` when the suffix is absent.
///
/// Works on the raw path, so non UTF-8 names round-trip too.
pub fn source_of(companion: &Path) -> Option<PathBuf> {
    let extension = COMPANION_SUFFIX.trim_start_matches('.');
    if companion.extension()? != extension {
        return None;
    }
    Some(companion.with_extension(""))
}

/// True for `<name>.<jpg|jpeg|png>.webp`; a plain `photo.webp` upload is not a companion
pub fn is_companion(path: &Path) -> bool {
    source_of(path).map_or(false, |source| has_source_extension(&source))
}

/// What happened when a companion was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Absent,
    Failed,
}

/// Delete the companion of `source` if it exists; failures are logged only
pub async fn remove_companion_of(source: &Path) -> Removal {
    remove_companion(&companion_path(source)).await
}

/// Delete a companion file if it exists; failures are logged only
pub async fn remove_companion(companion: &Path) -> Removal {
    if !companion.exists() {
        debug!("No companion to remove at {}", companion.display());
        return Removal::Absent;
    }

    match tokio::fs::remove_file(companion).await {
        Ok(()) => {
            info!("Removed companion {}", companion.display());
            Removal::Removed
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Companion vanished before removal: {}", companion.display());
            Removal::Absent
        }
        Err(e) => {
            warn!("Failed to remove companion {}: {}", companion.display(), e);
            Removal::Failed
        }
    }
}
