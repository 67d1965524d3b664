//! Message queue management.

use crate::error::OsalError;
use crate::table::ResourceTable;
use crate::task::TaskRegistry;
use backend_api::{BackendError, KernelBackend, QueueWait};
use osal_types::limits::MAX_QUEUES;
use osal_types::{ObjectName, QueueId, TaskId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Default)]
struct QueueRecord {
    max_item_size: u32,
}

/// Snapshot of a queue's table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub name: ObjectName,
    pub creator: Option<TaskId>,
}

/// Manager for the message queue table.
pub struct QueueManager<B> {
    backend: Arc<B>,
    table: ResourceTable<QueueRecord>,
    tasks: TaskRegistry,
}

impl<B: KernelBackend> QueueManager<B> {
    /// Creates a manager with an empty table.
    pub fn new(backend: Arc<B>, tasks: TaskRegistry) -> Self {
        Self {
            backend,
            table: ResourceTable::new(MAX_QUEUES),
            tasks,
        }
    }

    /// Creates a queue holding up to `depth` messages of at most
    /// `item_size` bytes each. The backend capacity is sized as
    /// `depth * item_size` bytes.
    pub fn create(&self, name: &str, depth: u32, item_size: u32) -> Result<QueueId, OsalError> {
        let name = ObjectName::new(name)?;
        let capacity_bytes = depth
            .checked_mul(item_size)
            .ok_or(OsalError::GenericError)?;

        let id = self.table.reserve(&name)?;
        let native = match self.backend.queue_create(capacity_bytes) {
            Ok(native) => native,
            Err(err) => {
                log::warn!("queue create failed in backend ({err}), rolling back slot");
                self.table.abort_reservation(id);
                return Err(OsalError::GenericError);
            }
        };
        let creator = self.tasks.resolve(self.backend.current_task());
        self.table
            .populate(id, Some(native), creator, QueueRecord { max_item_size: item_size })?;
        Ok(QueueId::from(id))
    }

    /// Deletes a queue. Messages still queued are lost; subsequent
    /// operations on the id report [`OsalError::InvalidId`].
    pub fn delete(&self, id: QueueId) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        if let Err(err) = self.backend.queue_delete(native) {
            log::warn!("backend queue delete failed ({err}), slot kept");
            return Err(OsalError::GenericError);
        }
        self.table.release(id.raw())
    }

    /// Receives the oldest message into `buffer`, waiting per `wait`.
    ///
    /// The buffer must hold the queue's configured item size; anything
    /// smaller is rejected up front with [`OsalError::QueueInvalidSize`]
    /// rather than risking a truncated message. Returns the number of
    /// bytes copied.
    pub fn get(
        &self,
        id: QueueId,
        buffer: &mut [u8],
        wait: QueueWait,
    ) -> Result<usize, OsalError> {
        let (native, max_item_size) = self
            .table
            .read(id.raw(), |slot| (slot.native, slot.payload.max_item_size))?;
        let native = native.ok_or(OsalError::InvalidId)?;
        if (buffer.len() as u32) < max_item_size {
            return Err(OsalError::QueueInvalidSize);
        }
        match self.backend.queue_receive(native, buffer, wait) {
            Ok(copied) => Ok(copied),
            Err(BackendError::Timeout) => Err(OsalError::QueueTimeout),
            Err(BackendError::Failure) => Err(OsalError::GenericError),
        }
    }

    /// Appends a message. Never waits: a full queue reports
    /// [`OsalError::QueueFull`] immediately. Callable from
    /// interrupt/handler context.
    pub fn put(&self, id: QueueId, data: &[u8]) -> Result<(), OsalError> {
        let native = self.table.native(id.raw())?;
        match self.backend.queue_send(native, data) {
            Ok(()) => Ok(()),
            Err(BackendError::Timeout) => Err(OsalError::QueueFull),
            Err(BackendError::Failure) => Err(OsalError::GenericError),
        }
    }

    /// Finds a queue by name.
    pub fn get_id_by_name(&self, name: &str) -> Result<QueueId, OsalError> {
        let name = ObjectName::new(name)?;
        self.table.find_by_name(&name).map(QueueId::from)
    }

    /// Copies a queue's table entry into a caller-owned structure.
    pub fn get_info(&self, id: QueueId) -> Result<QueueInfo, OsalError> {
        self.table.read(id.raw(), |slot| QueueInfo {
            name: slot.name.clone(),
            creator: slot.creator,
        })
    }
}
