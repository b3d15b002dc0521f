//! # Progress Tracking and Statistics Module
//!
//! Feedback per i batch interattivi (sweep con `--progress`, `optimize` su più file).
//!
//! ## Responsabilità:
//! - Progress bar con `indicatif`
//! - Statistiche cumulative a partire dai `ProcessOutcome`
//!
//! ## Statistiche tracciate:
//! - **files_processed**: file passati alla pipeline
//! - **files_optimized**: file elaborati senza step falliti
//! - **files_skipped**: contenuto non JPEG/PNG
//! - **companions_written**: companion WebP scritti
//! - **errors**: file con almeno uno step fallito o senza companion
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 90/150 (60%) photo.jpg
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let progress = ProgressManager::new(files.len() as u64);
//! let mut stats = OptimizationStats::new();
//! for file in &files {
//!     stats.add(&processor.optimize(file).await);
//!     progress.update(&file.display().to_string());
//! }
//! progress.finish(&stats.format_summary());
//! ```

use crate::image_processor::ProcessOutcome;
use crate::utils::{calculate_reduction, format_size};
use crate::webp::CompanionOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        // Template is a literal; a parse failure would only lose the styling
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one file and show `message`
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_skipped: usize,
    pub companions_written: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
    pub errors: usize,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: &ProcessOutcome) {
        self.files_processed += 1;

        let report = match outcome {
            ProcessOutcome::Unsupported => {
                self.files_skipped += 1;
                return;
            }
            ProcessOutcome::Processed(report) => report,
        };

        self.total_original_size += report.original_size;
        self.total_bytes_saved += report.bytes_saved();

        if report.failed_steps == 0 {
            self.files_optimized += 1;
        }
        if matches!(report.companion, CompanionOutcome::Written(_)) {
            self.companions_written += 1;
        }
        if !report.is_clean() {
            self.errors += 1;
        }
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        calculate_reduction(
            self.total_original_size,
            self.total_original_size.saturating_sub(self.total_bytes_saved),
        )
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Skipped: {} | WebP: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_skipped,
            self.companions_written,
            self.errors,
            format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ImageKind;
    use crate::image_processor::ProcessReport;
    use std::path::PathBuf;

    fn processed(original: u64, optimized: u64, failed_steps: usize, companion: CompanionOutcome) -> ProcessOutcome {
        ProcessOutcome::Processed(ProcessReport {
            kind: ImageKind::Jpeg,
            original_size: original,
            optimized_size: optimized,
            failed_steps,
            companion,
        })
    }

    #[test]
    fn test_stats_from_outcomes() {
        let mut stats = OptimizationStats::new();
        stats.add(&processed(1000, 600, 0, CompanionOutcome::Written(PathBuf::from("a.jpg.webp"))));
        stats.add(&processed(1000, 1000, 1, CompanionOutcome::EncodeFailed));
        stats.add(&ProcessOutcome::Unsupported);

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_optimized, 1);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.companions_written, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_bytes_saved, 400);
        assert!((stats.overall_reduction_percent() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_stats() {
        let stats = OptimizationStats::new();
        assert_eq!(stats.overall_reduction_percent(), 0.0);
        assert!(stats.format_summary().starts_with("Processed: 0 files"));
    }
}
