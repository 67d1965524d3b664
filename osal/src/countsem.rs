//! Counting semaphore management.

use crate::error::OsalError;
use crate::table::ResourceTable;
use crate::task::TaskRegistry;
use backend_api::{BackendError, KernelBackend, SignalOutcome};
use osal_types::limits::{MAX_COUNT_SEMAPHORES, MAX_SEM_VALUE};
use osal_types::{CountSemId, ObjectName, TaskId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of a counting semaphore's table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSemInfo {
    pub name: ObjectName,
    pub creator: Option<TaskId>,
}

/// Manager for the counting semaphore table.
pub struct CountSemManager<B> {
    backend: Arc<B>,
    table: ResourceTable<()>,
    tasks: TaskRegistry,
}

impl<B: KernelBackend> CountSemManager<B> {
    /// Creates a manager with an empty table.
    pub fn new(backend: Arc<B>, tasks: TaskRegistry) -> Self {
        Self {
            backend,
            table: ResourceTable::new(MAX_COUNT_SEMAPHORES),
            tasks,
        }
    }

    /// Creates a counting semaphore.
    ///
    /// Unlike a binary semaphore there is no clamping: an initial value
    /// above the allowed maximum is rejected outright.
    pub fn create(&self, name: &str, initial_value: u32) -> Result<CountSemId, OsalError> {
        if initial_value > MAX_SEM_VALUE {
            return Err(OsalError::InvalidSemValue);
        }
        let name = ObjectName::new(name)?;

        let id = self.table.reserve(&name)?;
        let native = match self.backend.sem_create(initial_value, MAX_SEM_VALUE) {
            Ok(native) => native,
            Err(err) => {
                log::warn!(
                    "counting semaphore create failed in backend ({err}), rolling back slot"
                );
                self.table.abort_reservation(id);
                return Err(OsalError::SemFailure);
            }
        };
        let creator = self.tasks.resolve(self.backend.current_task());
        self.table.populate(id, Some(native), creator, ())?;
        Ok(CountSemId::from(id))
    }

    /// Deletes a counting semaphore.
    ///
    /// One best-effort signal precedes the destroy so a single pending
    /// waiter is released rather than stranded; its outcome is ignored.
    pub fn delete(&self, id: CountSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        let _ = self.backend.sem_signal(native);
        if self.backend.sem_delete(native).is_err() {
            return Err(OsalError::SemFailure);
        }
        self.table.release(id.raw())
    }

    /// Signals the semaphore. Callable from interrupt/handler context.
    ///
    /// A semaphore already at its maximum count cannot be given again.
    pub fn give(&self, id: CountSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        match self.backend.sem_signal(native) {
            Ok(SignalOutcome::Signaled) => Ok(()),
            Ok(SignalOutcome::Saturated) | Err(_) => Err(OsalError::SemFailure),
        }
    }

    /// Waits on the semaphore with no time bound. Never callable from
    /// interrupt context.
    pub fn take(&self, id: CountSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        self.backend
            .sem_wait(native)
            .map_err(|_| OsalError::SemFailure)
    }

    /// Waits on the semaphore for at most `millis` milliseconds.
    pub fn timed_wait(&self, id: CountSemId, millis: u32) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        match self.backend.sem_timed_wait(native, millis) {
            Ok(()) => Ok(()),
            Err(BackendError::Timeout) => Err(OsalError::SemTimeout),
            Err(BackendError::Failure) => Err(OsalError::SemFailure),
        }
    }

    /// Finds a counting semaphore by name.
    pub fn get_id_by_name(&self, name: &str) -> Result<CountSemId, OsalError> {
        let name = ObjectName::new(name)?;
        self.table.find_by_name(&name).map(CountSemId::from)
    }

    /// Copies a counting semaphore's table entry into a caller-owned
    /// structure.
    pub fn get_info(&self, id: CountSemId) -> Result<CountSemInfo, OsalError> {
        self.table.read(id.raw(), |slot| CountSemInfo {
            name: slot.name.clone(),
            creator: slot.creator,
        })
    }
}
