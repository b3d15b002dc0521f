//! # Upload Optimizer Library
//!
//! Ottimizzazione automatica delle immagini caricate in una media library:
//! compressione in place con tool esterni e companion WebP accanto a ogni sorgente.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per gli host che la integrano
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `tool_resolver` / `command`: Risoluzione ed esecuzione dei tool esterni
//! - `format`: Classificazione del contenuto (magic bytes)
//! - `compressor` / `webp` / `image_processor`: Ottimizzazione del singolo file
//! - `companion`: Naming e rimozione dei companion `.webp`
//! - `host` / `events`: Interfacce verso l'applicazione host
//! - `handlers`: Upload, delete e sweep di riconciliazione
//! - `scheduler` / `pipeline`: Sweep periodico e assemblaggio
//! - `progress`: Progress bar e statistiche
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use upload_optimizer::{Config, MediaPipeline, StaticMediaLibrary};
//!
//! let config = Config::from_file(&path).await?;
//! let library = Arc::new(StaticMediaLibrary::new(&config.upload_root));
//! let pipeline = MediaPipeline::from_config(config, library)?;
//! pipeline.uploads().on_uploaded(&file, sizes).await;
//! ```

pub mod command;
pub mod companion;
pub mod compressor;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod handlers;
pub mod host;
pub mod image_processor;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod tool_resolver;
pub mod utils;
pub mod webp;

#[cfg(test)]
mod testing;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use config::Config;
pub use error::OptimizeError;
pub use events::{AttachmentListener, LifecycleDispatcher};
pub use handlers::{DeletionHandler, DeletionReport, ReconciliationSweep, SweepReport, UploadHandler, UploadReport};
pub use host::{AttachmentRecord, MediaLibrary, SizeVariantSet, StaticMediaLibrary};
pub use image_processor::{ImageProcessor, ProcessOutcome, ProcessReport};
pub use pipeline::MediaPipeline;
pub use scheduler::SweepScheduler;
pub use tool_resolver::ToolPathResolver;
