//! # Sweep Scheduler
//!
//! Registra lo sweep di riconciliazione come task tokio ricorrente.
//!
//! ## Responsabilità:
//! - `schedule()`: prima esecuzione dopo un intervallo, poi una per intervallo
//! - Nessuna doppia registrazione: una seconda `schedule()` non fa nulla
//! - `unschedule()` abortisce il task; anche il `Drop` lo fa
//! - Con lo sweep disabilitato non viene registrato niente

use crate::handlers::ReconciliationSweep;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct SweepScheduler {
    sweep: Arc<ReconciliationSweep>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SweepScheduler {
    pub fn new(sweep: Arc<ReconciliationSweep>, interval: Duration) -> Self {
        Self {
            sweep,
            interval,
            handle: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Must be called from within a tokio runtime.
    ///
    /// Returns whether a new task was registered.
    pub fn schedule(&self) -> bool {
        if !self.sweep.is_enabled() {
            debug!("Sweep disabled, not scheduling");
            return false;
        }
        if self.interval.is_zero() {
            warn!("Sweep interval is zero, not scheduling");
            return false;
        }

        let mut handle = self.lock();
        if handle.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Sweep already scheduled");
            return false;
        }

        let sweep = Arc::clone(&self.sweep);
        let period = self.interval;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                sweep.run().await;
            }
        }));

        info!("Sweep of {} scheduled every {:?}", self.sweep.root().display(), period);
        true
    }

    pub fn unschedule(&self) {
        if let Some(task) = self.lock().take() {
            task.abort();
            info!("Sweep unscheduled");
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.lock().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        // A panic while holding the lock cannot leave the handle half-written
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        self.unschedule();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::image_processor::ImageProcessor;
    use crate::testing::{test_config, FakeRunner};
    use std::path::Path;
    use tempfile::TempDir;

    fn scheduler(root: &Path, enabled: bool, interval: Duration) -> SweepScheduler {
        let config = Config {
            sweep_enabled: enabled,
            ..test_config(root)
        };
        let processor = Arc::new(ImageProcessor::new(config, Arc::new(FakeRunner::new())));
        SweepScheduler::new(Arc::new(ReconciliationSweep::new(processor)), interval)
    }

    #[tokio::test]
    async fn test_schedule_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let scheduler = scheduler(temp_dir.path(), true, Duration::from_secs(3600));

        assert!(scheduler.schedule());
        assert!(!scheduler.schedule());
        assert!(scheduler.is_scheduled());

        scheduler.unschedule();
        assert!(!scheduler.is_scheduled());
        assert!(scheduler.schedule());
    }

    #[tokio::test]
    async fn test_disabled_sweep_is_never_scheduled() {
        let temp_dir = TempDir::new().unwrap();
        let scheduler = scheduler(temp_dir.path(), false, Duration::from_secs(3600));

        assert!(!scheduler.schedule());
        assert!(!scheduler.is_scheduled());
    }

    #[tokio::test]
    async fn test_scheduled_sweep_runs_after_one_interval() {
        let temp_dir = TempDir::new().unwrap();
        let orphan = temp_dir.path().join("gone.jpg.webp");
        std::fs::write(&orphan, b"webp").unwrap();
        let scheduler = scheduler(temp_dir.path(), true, Duration::from_millis(200));

        scheduler.schedule();
        assert!(orphan.exists());

        for _ in 0..50 {
            if !orphan.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!orphan.exists());
    }

    #[tokio::test]
    async fn test_unschedule_without_task() {
        let temp_dir = TempDir::new().unwrap();
        let scheduler = scheduler(temp_dir.path(), true, Duration::from_secs(1));

        scheduler.unschedule();
        assert!(!scheduler.is_scheduled());
    }
}
