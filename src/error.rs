//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Image`: Errori di decodifica immagini (formati corrotti, header troncati)
//! - `Tool`: Tool esterno terminato con exit status non zero
//! - `Timeout`: Tool esterno interrotto dopo il timeout configurato
//! - `MissingDependency`: Tool esterno mancante (jpegoptim, optipng, pngquant, cwebp)
//! - `UnsupportedFormat`: Contenuto che non è JPEG né PNG
//! - `Validation`: Errori di validazione input
//! - `Config`: Configurazione non valida
//!
//! Le operazioni del core (optimize, upload, delete, sweep) non propagano mai
//! questi errori: li trasformano in eventi `tracing` e in outcome.

use std::path::PathBuf;

/// Custom error types for upload optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{program} exited with {status}: {output}")]
    Tool {
        program: String,
        status: String,
        output: String,
    },

    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("File validation error: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
