//! # WebP Companion Generator
//!
//! Produces `<source>.webp` next to a JPEG/PNG source with `cwebp`.
//!
//! ## Pipeline
//! 1. **Capability gate**: se `cwebp` non è disponibile la generazione viene saltata in silenzio
//! 2. **Decode header**: il sorgente viene decodificato con `image` per leggere le dimensioni;
//!    un errore del decoder viene loggato e nessun file viene scritto
//! 3. **Resize plan**: `-resize 0 <max_height>` solo se l'altezza supera il limite
//!    (width 0 = auto, aspect ratio preservato, mai upscale)
//! 4. **Encode**: `cwebp -quiet -q <quality>` su un file di staging nella stessa directory
//! 5. **Commit**: rename atomico dello staging sul companion, sovrascrivendo quello esistente
//!
//! Se cwebp fallisce lo staging viene eliminato: non esiste mai un companion parziale.

use crate::command::CommandRunner;
use crate::companion::companion_path;
use crate::config::Config;
use crate::format;
use crate::utils::to_string_vec;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const CWEBP: &str = "cwebp";

/// What happened to the companion of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionOutcome {
    /// Companion written (or overwritten) at this path
    Written(PathBuf),
    /// The WebP encoder is not installed
    Unavailable,
    /// The source could not be decoded; nothing was written
    DecodeFailed,
    /// The encoder failed; nothing was written
    EncodeFailed,
}

/// Height passed to the resizer, or `None` to keep the original size
pub fn resize_height(height: u32, max_height: u32) -> Option<u32> {
    (height > max_height).then_some(max_height)
}

pub struct WebpGenerator {
    runner: Arc<dyn CommandRunner>,
    quality: u8,
    max_height: u32,
}

impl WebpGenerator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Self {
        Self {
            runner,
            quality: config.webp_quality,
            max_height: config.webp_max_height,
        }
    }

    /// Whether this runtime can encode WebP at all
    pub fn is_available(&self) -> bool {
        self.runner.is_available(CWEBP)
    }

    pub async fn generate(&self, source: &Path) -> CompanionOutcome {
        if !self.is_available() {
            debug!("{} not available, skipping WebP companion for {}", CWEBP, source.display());
            return CompanionOutcome::Unavailable;
        }

        let info = match format::inspect(source).await {
            Ok(info) => info,
            Err(e) => {
                error!("Cannot decode {} for WebP companion: {}", source.display(), e);
                return CompanionOutcome::DecodeFailed;
            }
        };

        let target = companion_path(source);
        let directory = target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let staging = match tempfile::Builder::new()
            .prefix(".companion-")
            .suffix(".tmp")
            .tempfile_in(directory)
        {
            Ok(staging) => staging,
            Err(e) => {
                warn!("Cannot create staging file in {}: {}", directory.display(), e);
                return CompanionOutcome::EncodeFailed;
            }
        };

        let (Some(source_str), Some(staging_str)) = (source.to_str(), staging.path().to_str()) else {
            warn!("Skipping WebP companion for non UTF-8 path {:?}", source);
            return CompanionOutcome::EncodeFailed;
        };

        let quality = self.quality.to_string();
        let mut args = to_string_vec(["-quiet", "-q", quality.as_str()]);
        if let Some(height) = resize_height(info.height, self.max_height) {
            debug!(
                "Downscaling companion of {} from {}x{} to height {}",
                source.display(),
                info.width,
                info.height,
                height
            );
            args.extend(to_string_vec(["-resize".to_string(), "0".to_string(), height.to_string()]));
        }
        args.extend(to_string_vec([source_str, "-o", staging_str]));

        let output = self.runner.run(CWEBP, &args).await;
        if let Err(e) = output.check() {
            warn!("WebP encoding failed for {}: {}", source.display(), e);
            return CompanionOutcome::EncodeFailed;
        }

        // Staging files are created private; companions are served like their source
        match tokio::fs::metadata(source).await {
            Ok(meta) => {
                if let Err(e) = tokio::fs::set_permissions(staging.path(), meta.permissions()).await {
                    debug!("Cannot copy permissions of {} to companion: {}", source.display(), e);
                }
            }
            Err(e) => debug!("Cannot read permissions of {}: {}", source.display(), e),
        }

        match staging.persist(&target) {
            Ok(_) => {
                info!("Created WebP companion {}", target.display());
                CompanionOutcome::Written(target)
            }
            Err(e) => {
                warn!("Cannot move WebP companion into {}: {}", target.display(), e.error);
                CompanionOutcome::EncodeFailed
            }
        }
    }
}
