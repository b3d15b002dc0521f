//! # Media Pipeline
//!
//! Punto di assemblaggio del sistema, l'equivalente di `MediaOptimizer` per gli upload.
//!
//! ## Responsabilità:
//! - Valida configurazione e upload root
//! - Costruisce `ImageProcessor`, i tre handler e lo scheduler sullo stesso runner
//! - `activate()` / `deactivate()` registrano e rimuovono lo sweep periodico
//! - Implementa `AttachmentListener` per essere registrata in un `LifecycleDispatcher`
//!
//! ## Esempio:
//! ```rust,ignore
//! let library = Arc::new(StaticMediaLibrary::new(&config.upload_root));
//! let pipeline = Arc::new(MediaPipeline::from_config(config, library)?);
//!
//! let mut dispatcher = LifecycleDispatcher::new();
//! dispatcher.register(pipeline.clone());
//! pipeline.activate();
//! ```

use crate::command::{CommandRunner, SystemCommandRunner};
use crate::config::Config;
use crate::error::{OptimizeError, Result};
use crate::events::AttachmentListener;
use crate::handlers::{DeletionHandler, ReconciliationSweep, UploadHandler};
use crate::host::{MediaLibrary, SizeVariantSet};
use crate::image_processor::ImageProcessor;
use crate::scheduler::SweepScheduler;
use crate::tool_resolver::ToolPathResolver;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct MediaPipeline {
    processor: Arc<ImageProcessor>,
    uploads: UploadHandler,
    deletions: DeletionHandler,
    sweep: Arc<ReconciliationSweep>,
    scheduler: SweepScheduler,
}

impl MediaPipeline {
    /// Pipeline running the real external tools
    pub fn from_config(config: Config, library: Arc<dyn MediaLibrary>) -> Result<Self> {
        let resolver = ToolPathResolver::new(config.tools_dir.clone());
        let runner = SystemCommandRunner::new(resolver, config.tool_timeout());
        Self::with_runner(config, Arc::new(runner), library)
    }

    /// Variants resolve against the library's root and the sweep scans the
    /// config's, so the two must be the same directory
    pub fn with_runner(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        library: Arc<dyn MediaLibrary>,
    ) -> Result<Self> {
        config.validate()?;
        validate_upload_root(&config.upload_root)?;
        if library.upload_root() != config.upload_root.as_path() {
            return Err(OptimizeError::Validation(format!(
                "media library root {} differs from upload root {}",
                library.upload_root().display(),
                config.upload_root.display()
            )));
        }

        let interval = config.sweep_interval();
        let processor = Arc::new(ImageProcessor::new(config, runner));
        let sweep = Arc::new(ReconciliationSweep::new(processor.clone()));

        info!(
            "Media pipeline ready on {} (sweep {})",
            sweep.root().display(),
            if sweep.is_enabled() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            uploads: UploadHandler::new(processor.clone(), library.clone()),
            deletions: DeletionHandler::new(library),
            scheduler: SweepScheduler::new(sweep.clone(), interval),
            sweep,
            processor,
        })
    }

    pub fn processor(&self) -> &Arc<ImageProcessor> {
        &self.processor
    }

    pub fn uploads(&self) -> &UploadHandler {
        &self.uploads
    }

    pub fn deletions(&self) -> &DeletionHandler {
        &self.deletions
    }

    pub fn sweep(&self) -> &Arc<ReconciliationSweep> {
        &self.sweep
    }

    pub fn scheduler(&self) -> &SweepScheduler {
        &self.scheduler
    }

    /// Registers the periodic sweep if enabled; requires a tokio runtime
    pub fn activate(&self) -> bool {
        self.scheduler.schedule()
    }

    pub fn deactivate(&self) {
        self.scheduler.unschedule();
    }
}

#[async_trait]
impl AttachmentListener for MediaPipeline {
    async fn on_uploaded(&self, source: &Path, sizes: SizeVariantSet) -> SizeVariantSet {
        self.uploads.on_uploaded(source, sizes).await
    }

    async fn on_deleted(&self, attachment_id: &str) {
        self.deletions.on_deleted(attachment_id).await;
    }
}

pub fn validate_upload_root(root: &Path) -> Result<()> {
    if root.as_os_str().is_empty() {
        return Err(OptimizeError::Validation("upload root is not configured".to_string()));
    }
    if !root.exists() {
        return Err(OptimizeError::Validation(format!(
            "upload root does not exist: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(OptimizeError::Validation(format!(
            "upload root is not a directory: {}",
            root.display()
        )));
    }
    Ok(())
}
