//! Task management.

use crate::error::OsalError;
use crate::table::ResourceTable;
use backend_api::{KernelBackend, TaskEntry};
use osal_types::limits::{MAX_PRIORITY, MAX_TASKS};
use osal_types::{NativeHandle, ObjectName, TaskId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Callback run synchronously when a task is deleted or exits.
///
/// A hook belongs to one slot, installed by the task itself, and runs at
/// most once.
pub type DeleteHook = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct TaskRecord {
    stack_size: u32,
    priority: u32,
    delete_hook: Option<DeleteHook>,
}

/// Snapshot of a task's table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: ObjectName,
    pub creator: Option<TaskId>,
    pub stack_size: u32,
    pub priority: u32,
    pub native: NativeHandle,
}

/// Read-only view of the task table shared with the other managers.
///
/// Every object records its creator; resolving the creator means mapping
/// the backend's current-task handle back to a task id. Only the task
/// table can answer that, so the other managers hold one of these and
/// take its lock sequentially with their own, never nested inside it.
#[derive(Clone)]
pub struct TaskRegistry {
    table: Arc<ResourceTable<TaskRecord>>,
}

impl TaskRegistry {
    /// Maps a backend task handle to the task id occupying the table.
    pub(crate) fn resolve(&self, native: Option<NativeHandle>) -> Option<TaskId> {
        native
            .and_then(|handle| self.table.find_by_native(handle))
            .map(TaskId::from)
    }
}

/// Manager for the task table.
pub struct TaskManager<B> {
    backend: Arc<B>,
    table: Arc<ResourceTable<TaskRecord>>,
}

impl<B: KernelBackend> TaskManager<B> {
    /// Creates a manager with an empty table.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            table: Arc::new(ResourceTable::new(MAX_TASKS)),
        }
    }

    /// Returns a registry handle for creator resolution.
    pub fn registry(&self) -> TaskRegistry {
        TaskRegistry {
            table: Arc::clone(&self.table),
        }
    }

    /// Creates a task and makes it ready for scheduling.
    ///
    /// Validation happens before any backend call; if the backend create
    /// or activation fails, the reserved slot is returned to the free
    /// state and the error is reported as [`OsalError::GenericError`].
    pub fn create(
        &self,
        name: &str,
        entry: TaskEntry,
        stack_size: u32,
        priority: u32,
    ) -> Result<TaskId, OsalError> {
        let name = ObjectName::new(name)?;
        if priority > MAX_PRIORITY {
            return Err(OsalError::InvalidPriority);
        }

        let id = self.table.reserve(&name)?;
        let native = match self.backend.task_create(entry, stack_size, priority) {
            Ok(native) => native,
            Err(err) => {
                log::warn!("task create failed in backend ({err}), rolling back slot");
                self.table.abort_reservation(id);
                return Err(OsalError::GenericError);
            }
        };
        if let Err(err) = self.backend.task_activate(native) {
            log::warn!("task activation failed in backend ({err}), rolling back slot");
            let _ = self.backend.task_delete(native);
            self.table.abort_reservation(id);
            return Err(OsalError::GenericError);
        }

        let creator = self.resolve_creator();
        self.table.populate(
            id,
            Some(native),
            creator,
            TaskRecord {
                stack_size,
                priority,
                delete_hook: None,
            },
        )?;
        Ok(TaskId::from(id))
    }

    /// Deletes a task.
    ///
    /// The installed delete hook, if any, runs before the backend call.
    /// If the backend refuses the deletion the slot stays occupied: the
    /// table must not claim an object is gone while the kernel still
    /// schedules it.
    pub fn delete(&self, id: TaskId) -> Result<(), OsalError> {
        let hook = self.table.update(id.raw(), |record| record.delete_hook.take())?;
        if let Some(mut hook) = hook {
            hook();
        }
        let native = self.table.native(id.raw())?;
        if let Err(err) = self.backend.task_delete(native) {
            log::warn!("backend task delete failed ({err}), slot kept");
            return Err(OsalError::GenericError);
        }
        self.table.release(id.raw())
    }

    /// Terminates the calling task.
    ///
    /// Table cleanup (hook, slot release) is best-effort; the backend
    /// self-termination is attempted regardless of whether the caller
    /// could be resolved in the table.
    pub fn exit(&self) -> Result<(), OsalError> {
        if let Some(raw) = self
            .backend
            .current_task()
            .and_then(|native| self.table.find_by_native(native))
        {
            if let Ok(Some(mut hook)) = self.table.update(raw, |record| record.delete_hook.take())
            {
                hook();
            }
            let _ = self.table.release(raw);
        }
        self.backend.task_exit().map_err(|_| OsalError::GenericError)
    }

    /// Suspends the calling task for `millis` milliseconds.
    pub fn delay(&self, millis: u32) -> Result<(), OsalError> {
        self.backend
            .task_sleep(millis)
            .map_err(|_| OsalError::GenericError)
    }

    /// Changes a task's priority. The stored priority is updated only
    /// once the backend has accepted the change.
    pub fn set_priority(&self, id: TaskId, new_priority: u32) -> Result<(), OsalError> {
        if new_priority > MAX_PRIORITY {
            return Err(OsalError::InvalidPriority);
        }
        let native = self.table.native(id.raw())?;
        self.backend
            .task_set_priority(native, new_priority)
            .map_err(|_| OsalError::GenericError)?;
        self.table
            .update(id.raw(), |record| record.priority = new_priority)
    }

    /// Finds a task by name.
    pub fn get_id_by_name(&self, name: &str) -> Result<TaskId, OsalError> {
        let name = ObjectName::new(name)?;
        self.table.find_by_name(&name).map(TaskId::from)
    }

    /// Copies a task's table entry into a caller-owned structure.
    pub fn get_info(&self, id: TaskId) -> Result<TaskInfo, OsalError> {
        let (name, creator, native, stack_size, priority) =
            self.table.read(id.raw(), |slot| {
                (
                    slot.name.clone(),
                    slot.creator,
                    slot.native,
                    slot.payload.stack_size,
                    slot.payload.priority,
                )
            })?;
        Ok(TaskInfo {
            name,
            creator,
            stack_size,
            priority,
            native: native.ok_or(OsalError::InvalidId)?,
        })
    }

    /// Installs a delete hook on the calling task's own slot.
    pub fn install_delete_handler(&self, hook: DeleteHook) -> Result<(), OsalError> {
        let raw = self
            .backend
            .current_task()
            .and_then(|native| self.table.find_by_native(native))
            .ok_or(OsalError::InvalidId)?;
        self.table
            .update(raw, move |record| record.delete_hook = Some(hook))
    }

    fn resolve_creator(&self) -> Option<TaskId> {
        self.backend
            .current_task()
            .and_then(|native| self.table.find_by_native(native))
            .map(TaskId::from)
    }
}
