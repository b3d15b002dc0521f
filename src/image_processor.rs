//! # Image Processing Module
//!
//! Questo modulo contiene l'unità atomica di lavoro della pipeline: dato un
//! path, ottimizza il file in place con i tool esterni e genera il suo
//! companion WebP.
//!
//! ## Pipeline di Ottimizzazione
//!
//! 1. **Rilevamento formato**: magic bytes del contenuto, mai l'estensione
//! 2. **Formati non supportati**: no-op silenzioso (nessun processo, nessuna scrittura)
//! 3. **JPEG**: jpegoptim (lossy, max 80, strip metadata, in place)
//! 4. **PNG**: optipng (lossless, -o7) e poi pngquant (lossy, 60-80, speed 1)
//! 5. **Companion**: cwebp sul file appena ottimizzato
//!
//! ## Error Handling
//!
//! `optimize()` non restituisce mai errori: ogni step fallito viene loggato
//! con path e output del tool e la pipeline prosegue. Un file corrotto non
//! può interrompere un batch.
//!
//! ## Esempio
//!
//! ```rust,ignore
//! let processor = ImageProcessor::new(config, runner);
//! match processor.optimize(Path::new("/srv/uploads/photo.jpg")).await {
//!     ProcessOutcome::Processed(report) => info!("{} bytes saved", report.bytes_saved()),
//!     ProcessOutcome::Unsupported => {}
//! }
//! ```

use crate::command::CommandRunner;
use crate::compressor::{Compressor, CompressorInvoker};
use crate::config::Config;
use crate::format::{self, ImageKind};
use crate::utils::{calculate_reduction, format_size};
use crate::webp::{CompanionOutcome, WebpGenerator};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of processing one supported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub kind: ImageKind,
    pub original_size: u64,
    pub optimized_size: u64,
    /// Compressor steps that exited unsuccessfully
    pub failed_steps: usize,
    pub companion: CompanionOutcome,
}

impl ProcessReport {
    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.optimized_size)
    }

    pub fn is_clean(&self) -> bool {
        self.failed_steps == 0 && matches!(self.companion, CompanionOutcome::Written(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Not JPEG/PNG content (or unreadable); nothing was touched
    Unsupported,
    Processed(ProcessReport),
}

/// Optimizes single files in place and maintains their WebP companion
pub struct ImageProcessor {
    config: Config,
    compressors: CompressorInvoker,
    webp: WebpGenerator,
}

impl ImageProcessor {
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        let webp = WebpGenerator::new(runner.clone(), &config);
        Self {
            config,
            compressors: CompressorInvoker::new(runner),
            webp,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Optimize `path` in place and (re)generate its companion.
    ///
    /// Never fails; unsupported content is a silent no-op.
    pub async fn optimize(&self, path: &Path) -> ProcessOutcome {
        let kind = format::sniff(path).await;
        if !kind.is_supported() {
            debug!("Skipping unsupported file: {}", path.display());
            return ProcessOutcome::Unsupported;
        }

        let original_size = file_size(path).await;
        let mut failed_steps = 0;

        for compressor in Compressor::pipeline(kind) {
            if !self.compressors.invoke(*compressor, &self.config, path).await {
                failed_steps += 1;
            }
        }

        let optimized_size = file_size(path).await;
        info!(
            "{}: {} -> {} ({:.1}% saved)",
            path.display(),
            format_size(original_size),
            format_size(optimized_size),
            calculate_reduction(original_size, optimized_size)
        );

        let companion = self.webp.generate(path).await;

        ProcessOutcome::Processed(ProcessReport {
            kind,
            original_size,
            optimized_size,
            failed_steps,
            companion,
        })
    }
}

async fn file_size(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}
