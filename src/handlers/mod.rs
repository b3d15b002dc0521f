//! # Handlers Module
//!
//! Entry points triggered from outside the core:
//! - `upload`: host upload lifecycle (original + size variants)
//! - `deletion`: host deletion lifecycle (companion cleanup)
//! - `sweep`: periodic reconciliation of the upload root

pub mod deletion;
pub mod sweep;
pub mod upload;

pub use deletion::{DeletionHandler, DeletionReport};
pub use sweep::{DirectoryScan, ReconciliationSweep, SweepReport};
pub use upload::{UploadHandler, UploadReport};
