//! # External Compressors
//!
//! Argument contracts of the three command-line optimizers and the invoker
//! that runs them one step at a time.
//!
//! ## Pipeline per formato
//!
//! | Formato | Step | Tool      | Argomenti                                             |
//! |---------|------|-----------|-------------------------------------------------------|
//! | JPEG    | 1    | jpegoptim | `-q --strip-all --preserve --force --max=80 <file>`   |
//! | PNG     | 1    | optipng   | `-quiet -preserve -o7 -strip all <file>`              |
//! | PNG     | 2    | pngquant  | `-f --ext .png --quality=60-80 --speed=1 <file>`      |
//!
//! Tutti i tool lavorano in place sul file indicato. Un exit status non zero
//! viene loggato con path e output catturato; la pipeline prosegue comunque
//! con lo step successivo.

use crate::args;
use crate::command::CommandRunner;
use crate::config::Config;
use crate::format::ImageKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    /// Lossy JPEG optimizer
    Jpegoptim,
    /// Lossless PNG optimizer
    Optipng,
    /// Lossy palette-quantizing PNG optimizer
    Pngquant,
}

impl Compressor {
    pub fn program(&self) -> &'static str {
        match self {
            Compressor::Jpegoptim => "jpegoptim",
            Compressor::Optipng => "optipng",
            Compressor::Pngquant => "pngquant",
        }
    }

    /// Ordered steps for a content kind; empty for unsupported content
    pub fn pipeline(kind: ImageKind) -> &'static [Compressor] {
        match kind {
            ImageKind::Jpeg => &[Compressor::Jpegoptim],
            ImageKind::Png => &[Compressor::Optipng, Compressor::Pngquant],
            ImageKind::Unsupported => &[],
        }
    }

    /// Command-line arguments operating in place on `file`
    pub fn args(&self, config: &Config, file: &str) -> Vec<String> {
        match self {
            Compressor::Jpegoptim => args![
                "-q",
                "--strip-all",
                "--preserve",
                "--force",
                format!("--max={}", config.jpeg_max_quality),
                file,
            ],
            Compressor::Optipng => args![
                "-quiet",
                "-preserve",
                format!("-o{}", config.png_optimization_level),
                "-strip",
                "all",
                file,
            ],
            Compressor::Pngquant => args![
                "-f",
                "--ext",
                ".png",
                format!("--quality={}-{}", config.png_quality_min, config.png_quality_max),
                format!("--speed={}", config.png_speed),
                file,
            ],
        }
    }
}

/// Runs compressor steps through a `CommandRunner`
#[derive(Clone)]
pub struct CompressorInvoker {
    runner: Arc<dyn CommandRunner>,
}

impl CompressorInvoker {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run one step on `path`; returns whether it succeeded
    pub async fn invoke(&self, compressor: Compressor, config: &Config, path: &Path) -> bool {
        let Some(file) = path.to_str() else {
            warn!("Skipping {} on non UTF-8 path {:?}", compressor.program(), path);
            return false;
        };

        let args = compressor.args(config, file);
        let output = self.runner.run(compressor.program(), &args).await;

        match output.check() {
            Ok(()) => {
                debug!("{} finished on {} in {:?}", compressor.program(), path.display(), output.elapsed);
                true
            }
            Err(e) => {
                warn!("Optimization step failed for {}: {}", path.display(), e);
                false
            }
        }
    }
}
