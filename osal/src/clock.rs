//! Local time over the backend's monotonic clock.

use crate::error::OsalError;
use backend_api::KernelBackend;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A wall-clock-style timestamp: whole seconds plus the microsecond
/// remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTime {
    pub seconds: u64,
    pub microsecs: u32,
}

/// Settable local clock.
///
/// The backend only provides monotonic time since boot; callers that want
/// calendar-ish time set an offset once and the clock reports
/// `offset + monotonic` from then on. Setting the clock replaces the
/// offset, it does not rebase the monotonic source.
pub struct SystemClock<B> {
    backend: Arc<B>,
    offset_micros: AtomicU64,
}

impl<B: KernelBackend> SystemClock<B> {
    /// Creates a clock with a zero offset.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            offset_micros: AtomicU64::new(0),
        }
    }

    /// Returns the current local time.
    pub fn local_time(&self) -> Result<LocalTime, OsalError> {
        let now = self
            .backend
            .now_micros()
            .map_err(|_| OsalError::GenericError)?;
        let total = self.offset_micros.load(Ordering::Relaxed) + now;
        Ok(LocalTime {
            seconds: total / 1_000_000,
            microsecs: (total % 1_000_000) as u32,
        })
    }

    /// Sets the clock offset.
    pub fn set_local_time(&self, time: LocalTime) {
        let micros = time.seconds * 1_000_000 + u64::from(time.microsecs);
        self.offset_micros.store(micros, Ordering::Relaxed);
    }
}
