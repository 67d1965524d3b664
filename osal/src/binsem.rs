//! Binary semaphore management.

use crate::error::OsalError;
use crate::table::ResourceTable;
use crate::task::TaskRegistry;
use backend_api::{BackendError, KernelBackend, SignalOutcome};
use osal_types::limits::MAX_BIN_SEMAPHORES;
use osal_types::{BinSemId, ObjectName, TaskId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of a binary semaphore's table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSemInfo {
    pub name: ObjectName,
    pub creator: Option<TaskId>,
}

/// Manager for the binary semaphore table.
pub struct BinSemManager<B> {
    backend: Arc<B>,
    table: ResourceTable<()>,
    tasks: TaskRegistry,
}

impl<B: KernelBackend> BinSemManager<B> {
    /// Creates a manager with an empty table.
    pub fn new(backend: Arc<B>, tasks: TaskRegistry) -> Self {
        Self {
            backend,
            table: ResourceTable::new(MAX_BIN_SEMAPHORES),
            tasks,
        }
    }

    /// Creates a binary semaphore.
    ///
    /// An initial value above 1 is clamped to 1 rather than rejected.
    pub fn create(&self, name: &str, initial_value: u32) -> Result<BinSemId, OsalError> {
        let name = ObjectName::new(name)?;
        let initial = initial_value.min(1);

        let id = self.table.reserve(&name)?;
        let native = match self.backend.sem_create(initial, 1) {
            Ok(native) => native,
            Err(err) => {
                log::warn!("binary semaphore create failed in backend ({err}), rolling back slot");
                self.table.abort_reservation(id);
                return Err(OsalError::SemFailure);
            }
        };
        let creator = self.tasks.resolve(self.backend.current_task());
        self.table.populate(id, Some(native), creator, ())?;
        Ok(BinSemId::from(id))
    }

    /// Deletes a binary semaphore.
    pub fn delete(&self, id: BinSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        if self.backend.sem_delete(native).is_err() {
            return Err(OsalError::SemFailure);
        }
        self.table.release(id.raw())
    }

    /// Signals the semaphore. Callable from interrupt/handler context.
    ///
    /// A semaphore that is already given cannot be given again; the
    /// backend's saturation report is a failure here, unlike in
    /// [`flush`](Self::flush) where it is the goal.
    pub fn give(&self, id: BinSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        match self.backend.sem_signal(native) {
            Ok(SignalOutcome::Signaled) => Ok(()),
            Ok(SignalOutcome::Saturated) | Err(_) => Err(OsalError::SemFailure),
        }
    }

    /// Waits on the semaphore with no time bound. Never callable from
    /// interrupt context.
    pub fn take(&self, id: BinSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        self.backend
            .sem_wait(native)
            .map_err(|_| OsalError::SemFailure)
    }

    /// Waits on the semaphore for at most `millis` milliseconds.
    pub fn timed_wait(&self, id: BinSemId, millis: u32) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        match self.backend.sem_timed_wait(native, millis) {
            Ok(()) => Ok(()),
            Err(BackendError::Timeout) => Err(OsalError::SemTimeout),
            Err(BackendError::Failure) => Err(OsalError::SemFailure),
        }
    }

    /// Releases every task pending on the semaphore.
    ///
    /// Signals repeatedly until the backend reports saturation, which is
    /// the all-waiters-released condition and terminates the loop. The
    /// backend contract guarantees a bounded semaphore saturates under
    /// repeated signalling, so the loop cannot spin forever.
    pub fn flush(&self, id: BinSemId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        loop {
            match self.backend.sem_signal(native) {
                Ok(SignalOutcome::Signaled) => continue,
                Ok(SignalOutcome::Saturated) => return Ok(()),
                Err(_) => return Err(OsalError::SemFailure),
            }
        }
    }

    /// Finds a binary semaphore by name.
    pub fn get_id_by_name(&self, name: &str) -> Result<BinSemId, OsalError> {
        let name = ObjectName::new(name)?;
        self.table.find_by_name(&name).map(BinSemId::from)
    }

    /// Copies a binary semaphore's table entry into a caller-owned
    /// structure.
    pub fn get_info(&self, id: BinSemId) -> Result<BinSemInfo, OsalError> {
        self.table.read(id.raw(), |slot| BinSemInfo {
            name: slot.name.clone(),
            creator: slot.creator,
        })
    }
}
