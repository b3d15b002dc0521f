//! # Deletion Handler
//!
//! Removes the WebP companions of an attachment the host is deleting: the
//! original's and every size variant's. Whatever metadata the host has
//! already purged simply shrinks the set of removals attempted.

use crate::companion::{remove_companion_of, Removal};
use crate::host::MediaLibrary;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub removed: usize,
    pub absent: usize,
    pub failed: usize,
}

impl DeletionReport {
    fn record(&mut self, removal: Removal) {
        match removal {
            Removal::Removed => self.removed += 1,
            Removal::Absent => self.absent += 1,
            Removal::Failed => self.failed += 1,
        }
    }
}

pub struct DeletionHandler {
    library: Arc<dyn MediaLibrary>,
}

impl DeletionHandler {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self { library }
    }

    /// Host callback for a removed attachment; never fails
    pub async fn on_deleted(&self, id: &str) -> DeletionReport {
        let mut report = DeletionReport::default();

        let Some(record) = self.library.attachment(id) else {
            debug!("No metadata left for attachment {}, nothing to clean up", id);
            return report;
        };

        match record.file.as_deref() {
            Some(original) => report.record(remove_companion_of(original).await),
            None => debug!("Attachment {} has no original path", id),
        }

        let Some(sizes) = record.sizes else {
            debug!("Attachment {} has no size metadata", id);
            return report;
        };

        for (label, relative) in sizes.iter() {
            match self.library.resolve_variant_path(relative) {
                Some(variant) => report.record(remove_companion_of(&variant).await),
                None => warn!("Cannot resolve size '{}' ({}) of attachment {}", label, relative.display(), id),
            }
        }

        if report.failed > 0 {
            warn!("{} companion(s) of attachment {} could not be removed", report.failed, id);
        }
        report
    }
}
