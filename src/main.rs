//! # Upload Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso della CLI.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging con `tracing` (RUST_LOG ha la precedenza su `--verbose`)
//! - Caricamento della configurazione e validazione della upload root
//! - Dispatch ai sotto-comandi: optimize, upload, delete, sweep, daemon, tools
//!
//! ## Esempi di utilizzo:
//! ```bash
//! upload-optimizer --upload-root /srv/uploads optimize photo.jpg logo.png
//! upload-optimizer --upload-root /srv/uploads upload /srv/uploads/a.jpg --size thumbnail=a-150x150.jpg
//! upload-optimizer --upload-root /srv/uploads delete --library media.json 42
//! upload-optimizer --upload-root /srv/uploads sweep --enable --progress
//! upload-optimizer --config /etc/upload-optimizer.json daemon --now
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use upload_optimizer::progress::{OptimizationStats, ProgressManager};
use upload_optimizer::{
    AttachmentRecord, Config, MediaLibrary, MediaPipeline, ReconciliationSweep, SizeVariantSet,
    StaticMediaLibrary, ToolPathResolver,
};

#[derive(Parser)]
#[command(name = "upload-optimizer")]
#[command(about = "Optimize uploaded images in place and keep WebP companions in sync")]
struct Args {
    /// Configuration file (JSON); defaults to the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Upload root, overrides the configuration
    #[arg(short, long, global = true)]
    upload_root: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize files in place and write their WebP companions
    Optimize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Handle an upload: the original and its size variants
    Upload {
        file: PathBuf,

        /// Size variant as label=path (relative to the upload root)
        #[arg(short, long = "size", value_parser = parse_size)]
        sizes: Vec<(String, PathBuf)>,
    },

    /// Remove the companions of a deleted attachment
    Delete {
        /// Original file, or the attachment id when --library is given
        target: String,

        #[arg(short, long = "size", value_parser = parse_size, conflicts_with = "library")]
        sizes: Vec<(String, PathBuf)>,

        /// JSON manifest of attachment records
        #[arg(short, long)]
        library: Option<PathBuf>,
    },

    /// Run one reconciliation sweep of the upload root
    Sweep {
        /// Run even if the sweep is disabled in the configuration
        #[arg(long)]
        enable: bool,

        #[arg(long)]
        progress: bool,
    },

    /// Run the periodic sweep until Ctrl-C
    Daemon {
        #[arg(long)]
        enable: bool,

        /// Sweep once immediately before waiting for the first interval
        #[arg(long)]
        now: bool,
    },

    /// Report which external tools are available
    Tools,
}

fn parse_size(value: &str) -> std::result::Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((label, path)) if !label.is_empty() => Ok((label.to_string(), PathBuf::from(path))),
        _ => Err(format!("expected label=path, got '{}'", value)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(args.config.as_ref()).await?;
    if let Some(root) = args.upload_root {
        config.upload_root = root;
    }

    match args.command {
        Command::Tools => {
            let resolver = ToolPathResolver::new(config.tools_dir.clone());
            println!("{}", resolver.get_tools_report());
        }

        Command::Optimize { files } => {
            let pipeline = build_pipeline(config, None)?;
            let progress = (files.len() > 1).then(|| ProgressManager::new(files.len() as u64));
            let mut stats = OptimizationStats::new();

            for file in &files {
                if !file.is_file() {
                    bail!("Not a file: {}", file.display());
                }
            }
            for file in &files {
                stats.add(&pipeline.processor().optimize(file).await);
                if let Some(ref progress) = progress {
                    progress.update(&file.display().to_string());
                }
            }

            match progress {
                Some(progress) => progress.finish(&stats.format_summary()),
                None => info!("{}", stats.format_summary()),
            }
        }

        Command::Upload { file, sizes } => {
            let pipeline = build_pipeline(config, None)?;
            let sizes: SizeVariantSet = sizes.into_iter().collect();
            let returned = pipeline.uploads().on_uploaded(&file, sizes).await;
            println!("{}", serde_json::to_string_pretty(&returned)?);
        }

        Command::Delete { target, sizes, library } => {
            let root = config.upload_root.clone();
            let (library, id) = match library {
                Some(manifest) => (StaticMediaLibrary::from_manifest(root, &manifest).await?, target),
                None => {
                    let record = AttachmentRecord {
                        file: Some(PathBuf::from(&target)),
                        sizes: Some(sizes.into_iter().collect()),
                    };
                    (StaticMediaLibrary::new(root).with_record("cli", record), "cli".to_string())
                }
            };
            let library: Arc<dyn MediaLibrary> = Arc::new(library);
            let pipeline = build_pipeline(config, Some(library))?;
            let report = pipeline.deletions().on_deleted(&id).await;
            info!(
                "Companions removed: {}, already absent: {}, failed: {}",
                report.removed, report.absent, report.failed
            );
        }

        Command::Sweep { enable, progress } => {
            config.sweep_enabled |= enable;
            if !config.sweep_enabled {
                bail!("Sweep is disabled; pass --enable or set sweep_enabled in the configuration");
            }
            let pipeline = build_pipeline(config, None)?;
            let sweep = ReconciliationSweep::new(pipeline.processor().clone()).with_progress(progress);
            let report = sweep.run().await;
            if report.failures > 0 {
                bail!("Sweep finished with {} failure(s)", report.failures);
            }
        }

        Command::Daemon { enable, now } => {
            config.sweep_enabled |= enable;
            if !config.sweep_enabled {
                bail!("Sweep is disabled; pass --enable or set sweep_enabled in the configuration");
            }
            let pipeline = build_pipeline(config, None)?;
            if now {
                pipeline.sweep().run().await;
            }
            pipeline.activate();
            info!("Waiting for Ctrl-C");
            tokio::signal::ctrl_c().await?;
            pipeline.deactivate();
            info!("Shutting down");
        }
    }

    Ok(())
}

async fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file does not exist: {}", path.display());
            }
            Config::from_file(path).await
        }
        None => match Config::default_path() {
            Some(path) => Config::from_file(&path).await,
            None => Ok(Config::default()),
        },
    }
}

/// Validates the upload root before anything touches the filesystem
fn build_pipeline(config: Config, library: Option<Arc<dyn MediaLibrary>>) -> Result<MediaPipeline> {
    let library = match library {
        Some(library) => library,
        None => Arc::new(StaticMediaLibrary::new(config.upload_root.clone())),
    };
    Ok(MediaPipeline::from_config(config, library)?)
}
