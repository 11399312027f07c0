//! # Progress Module
//!
//! Status/progress callbacks and the cooperative stop flag shared by both batch
//! paths. Callbacks run on the orchestrating thread only and are best-effort:
//! an unset callback is a no-op.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::MatchError;

type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;
type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Optional status and progress sinks
#[derive(Clone, Default)]
pub struct Reporter {
    status: Option<StatusCallback>,
    progress: Option<ProgressCallback>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a status sink receiving human-readable messages
    pub fn with_status<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.status = Some(Arc::new(callback));
        self
    }

    /// Attach a progress sink receiving a percentage in `0..=100`
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn status(&self, message: &str) {
        if let Some(callback) = &self.status {
            callback(message);
        }
    }

    /// Report `done` of `total` steps as a percentage
    pub fn progress(&self, done: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(percent(done, total));
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("status", &self.status.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Cooperative cancellation flag, cheap to clone across threads
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running batch
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request so the engine can run again
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(MatchError::Cancelled)` once a stop was requested
    pub fn check(&self) -> Result<(), MatchError> {
        if self.is_stopped() {
            Err(MatchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
