//! # Upload Handler
//!
//! Runs after the host has stored an upload and generated its size variants.
//! The original is validated by content, then the original and every variant
//! go through `ImageProcessor`. The metadata is observed, never changed.

use crate::format;
use crate::host::{MediaLibrary, SizeVariantSet};
use crate::image_processor::{ImageProcessor, ProcessOutcome};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-upload outcome
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadReport {
    /// `None` when the original failed validation and nothing was done
    pub original: Option<ProcessOutcome>,
    /// Outcome per size label, for variants that could be resolved
    pub variants: Vec<(String, ProcessOutcome)>,
    /// Labels skipped because their path could not be resolved or does not exist
    pub skipped_variants: Vec<String>,
}

pub struct UploadHandler {
    processor: Arc<ImageProcessor>,
    library: Arc<dyn MediaLibrary>,
}

impl UploadHandler {
    pub fn new(processor: Arc<ImageProcessor>, library: Arc<dyn MediaLibrary>) -> Self {
        Self { processor, library }
    }

    /// Host callback: processes the upload and hands the metadata back unchanged
    pub async fn on_uploaded(&self, source: &Path, sizes: SizeVariantSet) -> SizeVariantSet {
        self.process(source, &sizes).await;
        sizes
    }

    /// Original first, then each variant; variants are independent of each other
    pub async fn process(&self, source: &Path, sizes: &SizeVariantSet) -> UploadReport {
        let mut report = UploadReport::default();

        match format::inspect(source).await {
            Ok(info) => debug!(
                "Upload {} is a valid {:?} ({}x{})",
                source.display(),
                info.kind,
                info.width,
                info.height
            ),
            Err(e) => {
                info!("Skipping upload {}: {}", source.display(), e);
                return report;
            }
        }

        report.original = Some(self.processor.optimize(source).await);

        for (label, relative) in sizes.iter() {
            let Some(variant) = self.library.resolve_variant_path(relative) else {
                warn!("Cannot resolve size '{}' ({}) of {}", label, relative.display(), source.display());
                report.skipped_variants.push(label.to_string());
                continue;
            };

            if !variant.is_file() {
                warn!("Size '{}' of {} is missing at {}", label, source.display(), variant.display());
                report.skipped_variants.push(label.to_string());
                continue;
            }

            let outcome = self.processor.optimize(&variant).await;
            report.variants.push((label.to_string(), outcome));
        }

        report
    }
}
