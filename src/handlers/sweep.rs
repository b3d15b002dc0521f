//! # Reconciliation Sweep
//!
//! Scansione periodica e idempotente della upload root.
//!
//! ## Flusso:
//! 1. **Guard**: se lo sweep non è abilitato ritorna subito, prima di toccare il filesystem
//! 2. **Discovery**: elenca sorgenti (`*.jpg`, `*.jpeg`, `*.png`, case-insensitive)
//!    e companion (`<sorgente>.webp`) di un solo livello, senza ricorsione
//! 3. **Orphan pass**: elimina i companion il cui sorgente non esiste più
//! 4. **Creation pass**: ottimizza ogni sorgente senza companion, che così lo ottiene
//!
//! ## Known gap:
//! Le size variant salvate in sottodirectory non vengono mai visitate.
//!
//! ## Concorrenza:
//! Nessun lock. Un upload concorrente può al massimo causare una doppia
//! ottimizzazione dello stesso file, innocua; le cancellazioni controllano
//! l'esistenza subito prima di agire.

use crate::companion::{companion_path, is_companion, remove_companion, source_of, Removal};
use crate::format::has_source_extension;
use crate::image_processor::{ImageProcessor, ProcessOutcome};
use crate::progress::{OptimizationStats, ProgressManager};
use crate::webp::CompanionOutcome;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Single-level listing of a directory, restartable: every call walks again
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    root: PathBuf,
}

impl DirectoryScan {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Regular files directly inside the root
    pub fn files(&self) -> impl Iterator<Item = PathBuf> {
        let root = self.root.clone();
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Cannot list {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
    }

    pub fn sources(&self) -> impl Iterator<Item = PathBuf> {
        self.files().filter(|path| has_source_extension(path))
    }

    pub fn companions(&self) -> impl Iterator<Item = PathBuf> {
        self.files().filter(|path| is_companion(path))
    }
}

/// Mutations performed by one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// False when the sweep flag was off and nothing was looked at
    pub ran: bool,
    pub orphans_removed: usize,
    pub companions_created: usize,
    /// Orphan removals or companion generations that failed
    pub failures: usize,
}

impl SweepReport {
    fn record_removal(&mut self, removal: Removal) {
        match removal {
            Removal::Removed => self.orphans_removed += 1,
            Removal::Absent => {}
            Removal::Failed => self.failures += 1,
        }
    }

    pub fn mutations(&self) -> usize {
        self.orphans_removed + self.companions_created
    }
}

pub struct ReconciliationSweep {
    processor: Arc<ImageProcessor>,
    scan: DirectoryScan,
    enabled: bool,
    show_progress: bool,
}

impl ReconciliationSweep {
    /// Root and flag come from the processor's configuration
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        let config = processor.config();
        let scan = DirectoryScan::new(config.upload_root.clone());
        let enabled = config.sweep_enabled;
        Self {
            processor,
            scan,
            enabled,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn root(&self) -> &Path {
        &self.scan.root
    }

    pub async fn run(&self) -> SweepReport {
        if !self.enabled {
            debug!("Sweep disabled, skipping");
            return SweepReport::default();
        }

        info!("Sweeping {}", self.root().display());
        let mut report = SweepReport {
            ran: true,
            ..Default::default()
        };

        let sources: Vec<PathBuf> = self.scan.sources().collect();
        let companions: Vec<PathBuf> = self.scan.companions().collect();
        debug!("Found {} sources and {} companions", sources.len(), companions.len());

        for companion in &companions {
            let Some(source) = source_of(companion) else {
                continue;
            };
            if source.exists() {
                continue;
            }
            report.record_removal(remove_companion(companion).await);
        }

        // External tools take UTF-8 arguments only
        let missing: Vec<&PathBuf> = sources
            .iter()
            .filter(|source| !companion_path(source).exists())
            .filter(|source| {
                let printable = source.to_str().is_some();
                if !printable {
                    debug!("Skipping non UTF-8 source {:?}", source);
                }
                printable
            })
            .collect();

        let progress = (self.show_progress && !missing.is_empty())
            .then(|| ProgressManager::new(missing.len() as u64));
        let mut stats = OptimizationStats::new();

        for source in missing {
            let outcome = self.processor.optimize(source).await;
            stats.add(&outcome);

            match &outcome {
                ProcessOutcome::Processed(processed) => match processed.companion {
                    CompanionOutcome::Written(_) => report.companions_created += 1,
                    _ => report.failures += 1,
                },
                ProcessOutcome::Unsupported => {
                    debug!("{} is not a supported image, no companion", source.display())
                }
            }

            if let Some(ref progress) = progress {
                let name = source.file_name().unwrap_or_default().to_string_lossy();
                progress.update(&name);
            }
        }

        if let Some(progress) = progress {
            progress.finish(&stats.format_summary());
        }

        info!(
            "Sweep finished: {} orphan(s) removed, {} companion(s) created, {} failure(s)",
            report.orphans_removed, report.companions_created, report.failures
        );
        report
    }
}
