//! Timer management.
//!
//! A timer slot exists independently of any backend object: creation only
//! claims the slot and stores the callback, and the backend timer is
//! created when the timer is armed. Start and interval values are in
//! microseconds; a start of exactly 0 means "do not arm" and an interval
//! of 0 means one-shot.

use crate::error::OsalError;
use crate::table::ResourceTable;
use crate::task::TaskRegistry;
use backend_api::{KernelBackend, TimerCallback};
use osal_types::limits::MAX_TIMERS;
use osal_types::{NativeHandle, ObjectName, TaskId, TimerId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Default)]
struct TimerRecord {
    start_micros: u64,
    interval_micros: u64,
    callback: Option<TimerCallback>,
    armed: Option<NativeHandle>,
}

/// Snapshot of a timer's table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerInfo {
    pub name: ObjectName,
    pub creator: Option<TaskId>,
    pub start_micros: u64,
    pub interval_micros: u64,
    /// The backend's timer resolution in microseconds.
    pub accuracy_micros: u64,
}

/// Manager for the timer table.
pub struct TimerManager<B> {
    backend: Arc<B>,
    table: ResourceTable<TimerRecord>,
    tasks: TaskRegistry,
}

impl<B: KernelBackend> TimerManager<B> {
    /// Creates a manager with an empty table.
    pub fn new(backend: Arc<B>, tasks: TaskRegistry) -> Self {
        Self {
            backend,
            table: ResourceTable::new(MAX_TIMERS),
            tasks,
        }
    }

    /// Creates a timer in the disarmed state.
    ///
    /// The callback is stored now and handed to the backend each time the
    /// timer is armed; the backend invokes it on expiry.
    pub fn create(&self, name: &str, callback: TimerCallback) -> Result<TimerId, OsalError> {
        let name = ObjectName::new(name)?;

        let id = self.table.reserve(&name)?;
        let creator = self.tasks.resolve(self.backend.current_task());
        self.table.populate(
            id,
            None,
            creator,
            TimerRecord {
                callback: Some(callback),
                ..TimerRecord::default()
            },
        )?;
        Ok(TimerId::from(id))
    }

    /// Programs the timer.
    ///
    /// Positive values below the backend's resolution are rounded up to
    /// it; exact zeros keep their special meaning (start 0 leaves the
    /// timer disarmed regardless of the interval, interval 0 makes it
    /// one-shot). An already-armed timer is disarmed first.
    pub fn set(&self, id: TimerId, start_micros: u64, interval_micros: u64) -> Result<(), OsalError> {
        let accuracy = self.backend.clock_accuracy_micros();
        let start = round_up_to_accuracy(start_micros, accuracy);
        let interval = round_up_to_accuracy(interval_micros, accuracy);

        let previous = self.table.update(id.raw(), |record| {
            record.start_micros = start;
            record.interval_micros = interval;
            record.armed.take()
        })?;
        if let Some(stale) = previous {
            let _ = self.backend.timer_cancel(stale);
            let _ = self.backend.timer_destroy(stale);
        }

        if start > 0 {
            let callback = self
                .table
                .update(id.raw(), |record| record.callback.clone())?
                .ok_or(OsalError::TimerErrInternal)?;
            let armed = self
                .backend
                .timer_arm(callback, start, interval)
                .map_err(|_| OsalError::TimerErrInternal)?;
            self.table
                .update(id.raw(), |record| record.armed = Some(armed))?;
        }
        Ok(())
    }

    /// Deletes a timer.
    ///
    /// The backend timer must be cancelled and destroyed before the slot
    /// is freed; if either step fails the slot stays occupied, the timer
    /// nominally still exists, and the deletion can be retried.
    pub fn delete(&self, id: TimerId) -> Result<(), OsalError> {
        let armed = self.table.read(id.raw(), |slot| slot.payload.armed)?;
        if let Some(handle) = armed {
            if self.backend.timer_cancel(handle).is_err() {
                log::warn!("backend timer cancel failed, slot kept");
                return Err(OsalError::TimerErrInternal);
            }
            if self.backend.timer_destroy(handle).is_err() {
                log::warn!("backend timer destroy failed, slot kept");
                return Err(OsalError::TimerErrInternal);
            }
        }
        self.table.release(id.raw())
    }

    /// Finds a timer by name.
    pub fn get_id_by_name(&self, name: &str) -> Result<TimerId, OsalError> {
        let name = ObjectName::new(name)?;
        self.table.find_by_name(&name).map(TimerId::from)
    }

    /// Copies a timer's table entry into a caller-owned structure.
    pub fn get_info(&self, id: TimerId) -> Result<TimerInfo, OsalError> {
        let accuracy_micros = self.backend.clock_accuracy_micros();
        self.table.read(id.raw(), |slot| TimerInfo {
            name: slot.name.clone(),
            creator: slot.creator,
            start_micros: slot.payload.start_micros,
            interval_micros: slot.payload.interval_micros,
            accuracy_micros,
        })
    }
}

fn round_up_to_accuracy(micros: u64, accuracy: u64) -> u64 {
    if micros > 0 && micros < accuracy {
        accuracy
    } else {
        micros
    }
}
