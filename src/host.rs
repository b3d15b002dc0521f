//! # Host Interfaces
//!
//! What the core needs from the application that owns the uploads:
//! the upload root, variant path resolution and whatever attachment
//! metadata is still known at deletion time.
//!
//! `StaticMediaLibrary` is an in-memory implementation, optionally loaded
//! from a JSON manifest:
//!
//! ```json
//! {
//!   "42": {
//!     "file": "/srv/uploads/2024/05/photo.jpg",
//!     "sizes": { "thumbnail": "2024/05/photo-150x150.jpg" }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Size label → path relative to the upload root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeVariantSet(BTreeMap<String, PathBuf>);

impl SizeVariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, relative_path: impl Into<PathBuf>) {
        self.0.insert(label.into(), relative_path.into());
    }

    pub fn get(&self, label: &str) -> Option<&Path> {
        self.0.get(label).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.0.iter().map(|(label, path)| (label.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<L: Into<String>, P: Into<PathBuf>> FromIterator<(L, P)> for SizeVariantSet {
    fn from_iter<T: IntoIterator<Item = (L, P)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(l, p)| (l.into(), p.into())).collect())
    }
}

/// What the host still knows about an attachment; either part may be gone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub sizes: Option<SizeVariantSet>,
}

/// The host application's media store
pub trait MediaLibrary: Send + Sync {
    fn upload_root(&self) -> &Path;

    /// Absolute path of a size variant; absolute inputs are returned unchanged
    fn resolve_variant_path(&self, relative: &Path) -> Option<PathBuf> {
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.upload_root().join(relative))
    }

    fn attachment(&self, id: &str) -> Option<AttachmentRecord>;
}

/// In-memory media library
#[derive(Debug, Clone, Default)]
pub struct StaticMediaLibrary {
    root: PathBuf,
    records: HashMap<String, AttachmentRecord>,
}

impl StaticMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            records: HashMap::new(),
        }
    }

    pub fn with_record(mut self, id: impl Into<String>, record: AttachmentRecord) -> Self {
        self.insert(id, record);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, record: AttachmentRecord) {
        self.records.insert(id.into(), record);
    }

    /// Load records from a JSON manifest (`id → record`)
    pub async fn from_manifest(root: impl Into<PathBuf>, manifest: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(manifest)
            .await
            .with_context(|| format!("Failed to read media manifest {}", manifest.display()))?;
        let records: HashMap<String, AttachmentRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse media manifest {}", manifest.display()))?;

        Ok(Self {
            root: root.into(),
            records,
        })
    }
}

impl MediaLibrary for StaticMediaLibrary {
    fn upload_root(&self) -> &Path {
        &self.root
    }

    fn attachment(&self, id: &str) -> Option<AttachmentRecord> {
        self.records.get(id).cloned()
    }
}
