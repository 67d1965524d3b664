//! Mutex management.
//!
//! Ownership tracking and priority inheritance belong to the backend;
//! this manager only runs the table protocol and maps results.

use crate::error::OsalError;
use crate::table::ResourceTable;
use crate::task::TaskRegistry;
use backend_api::KernelBackend;
use osal_types::limits::MAX_MUTEXES;
use osal_types::{MutexId, ObjectName, TaskId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of a mutex's table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexInfo {
    pub name: ObjectName,
    pub creator: Option<TaskId>,
}

/// Manager for the mutex table.
pub struct MutexManager<B> {
    backend: Arc<B>,
    table: ResourceTable<()>,
    tasks: TaskRegistry,
}

impl<B: KernelBackend> MutexManager<B> {
    /// Creates a manager with an empty table.
    pub fn new(backend: Arc<B>, tasks: TaskRegistry) -> Self {
        Self {
            backend,
            table: ResourceTable::new(MAX_MUTEXES),
            tasks,
        }
    }

    /// Creates a mutex, initially unowned.
    pub fn create(&self, name: &str) -> Result<MutexId, OsalError> {
        let name = ObjectName::new(name)?;

        let id = self.table.reserve(&name)?;
        let native = match self.backend.mutex_create() {
            Ok(native) => native,
            Err(err) => {
                log::warn!("mutex create failed in backend ({err}), rolling back slot");
                self.table.abort_reservation(id);
                return Err(OsalError::SemFailure);
            }
        };
        let creator = self.tasks.resolve(self.backend.current_task());
        self.table.populate(id, Some(native), creator, ())?;
        Ok(MutexId::from(id))
    }

    /// Deletes a mutex.
    pub fn delete(&self, id: MutexId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        if self.backend.mutex_delete(native).is_err() {
            return Err(OsalError::SemFailure);
        }
        self.table.release(id.raw())
    }

    /// Releases the mutex held by the calling task.
    pub fn give(&self, id: MutexId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        self.backend
            .mutex_unlock(native)
            .map_err(|_| OsalError::SemFailure)
    }

    /// Acquires the mutex, blocking until it is available. Never callable
    /// from interrupt context.
    pub fn take(&self, id: MutexId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        self.backend
            .mutex_lock(native)
            .map_err(|_| OsalError::SemFailure)
    }

    /// Finds a mutex by name.
    pub fn get_id_by_name(&self, name: &str) -> Result<MutexId, OsalError> {
        let name = ObjectName::new(name)?;
        self.table.find_by_name(&name).map(MutexId::from)
    }

    /// Copies a mutex's table entry into a caller-owned structure.
    pub fn get_info(&self, id: MutexId) -> Result<MutexInfo, OsalError> {
        self.table.read(id.raw(), |slot| MutexInfo {
            name: slot.name.clone(),
            creator: slot.creator,
        })
    }
}
