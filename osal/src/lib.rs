//! # OSAL
//!
//! Portable operating-system abstraction: tasks, message queues, binary
//! and counting semaphores, mutexes, and timers, managed in fixed-capacity
//! tables over an abstract kernel backend.
//!
//! ## Philosophy
//!
//! The kernel provides the **mechanisms** (scheduling, waiting, timer
//! expiry); this layer provides the **bookkeeping**: which objects exist,
//! what they are called, who created them, and which backend object each
//! one maps to. That bookkeeping has real invariants:
//!
//! - **Slots, not handles**: an object's identity is its position in its
//!   kind's table plus a generation counter. Allocation hands out the
//!   lowest free slot; a deleted object's id goes stale instead of
//!   aliasing the slot's next occupant.
//! - **Names are unique per table**, checked in the same critical section
//!   that reserves the slot.
//! - **Never block under a table lock**: locks guard short table edits;
//!   every backend call that can wait runs outside them.
//! - **No leaked reservations**: if the backend create fails, the
//!   reserved slot is freed before the error is reported. If a backend
//!   delete fails, the slot is kept: the table never claims an object is
//!   gone while the kernel still has it.
//!
//! ## Non-Goals
//!
//! This is NOT a scheduler, a wait-queue implementation, or a wire
//! format. Which task wakes when a semaphore is given, and in what order,
//! is entirely the backend's business.
//!
//! ## Example
//!
//! ```
//! use osal::Osal;
//! use sim_backend::SimBackend;
//!
//! fn entry() {}
//!
//! let osal = Osal::new(SimBackend::new());
//! let task = osal.tasks().create("worker", entry, 4096, 50).unwrap();
//! assert_eq!(osal.tasks().get_id_by_name("worker").unwrap(), task);
//! ```

pub mod binsem;
pub mod clock;
pub mod countsem;
pub mod error;
pub mod mutex;
pub mod queue;
mod table;
pub mod task;
pub mod timer;

pub use backend_api::{
    millis_to_ticks, BackendError, KernelBackend, QueueWait, SignalOutcome, TaskEntry,
    TimerCallback,
};
pub use binsem::{BinSemInfo, BinSemManager};
pub use clock::{LocalTime, SystemClock};
pub use countsem::{CountSemInfo, CountSemManager};
pub use error::{error_name, OsalError, UnknownErrorCode, UNKNOWN_ERROR_NAME};
pub use mutex::{MutexInfo, MutexManager};
pub use osal_types::{
    limits, BinSemId, CountSemId, MutexId, NameError, NativeHandle, ObjectName, QueueId, TaskId,
    TimerId,
};
pub use queue::{QueueInfo, QueueManager};
pub use task::{DeleteHook, TaskInfo, TaskManager, TaskRegistry};
pub use timer::{TimerInfo, TimerManager};

use std::sync::Arc;

/// The assembled abstraction layer: one manager per object kind plus the
/// local clock, all sharing one backend.
pub struct Osal<B: KernelBackend> {
    backend: Arc<B>,
    tasks: TaskManager<B>,
    queues: QueueManager<B>,
    bin_sems: BinSemManager<B>,
    count_sems: CountSemManager<B>,
    mutexes: MutexManager<B>,
    timers: TimerManager<B>,
    clock: SystemClock<B>,
}

impl<B: KernelBackend> Osal<B> {
    /// Builds the layer over a backend, initializing every table empty.
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Builds the layer over a shared backend.
    pub fn with_backend(backend: Arc<B>) -> Self {
        let tasks = TaskManager::new(Arc::clone(&backend));
        let registry = tasks.registry();
        Self {
            queues: QueueManager::new(Arc::clone(&backend), registry.clone()),
            bin_sems: BinSemManager::new(Arc::clone(&backend), registry.clone()),
            count_sems: CountSemManager::new(Arc::clone(&backend), registry.clone()),
            mutexes: MutexManager::new(Arc::clone(&backend), registry.clone()),
            timers: TimerManager::new(Arc::clone(&backend), registry),
            clock: SystemClock::new(Arc::clone(&backend)),
            tasks,
            backend,
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the task manager.
    pub fn tasks(&self) -> &TaskManager<B> {
        &self.tasks
    }

    /// Returns the message queue manager.
    pub fn queues(&self) -> &QueueManager<B> {
        &self.queues
    }

    /// Returns the binary semaphore manager.
    pub fn bin_sems(&self) -> &BinSemManager<B> {
        &self.bin_sems
    }

    /// Returns the counting semaphore manager.
    pub fn count_sems(&self) -> &CountSemManager<B> {
        &self.count_sems
    }

    /// Returns the mutex manager.
    pub fn mutexes(&self) -> &MutexManager<B> {
        &self.mutexes
    }

    /// Returns the timer manager.
    pub fn timers(&self) -> &TimerManager<B> {
        &self.timers
    }

    /// Returns the settable local clock.
    pub fn clock(&self) -> &SystemClock<B> {
        &self.clock
    }

    /// Converts milliseconds to backend clock ticks, rounding up.
    pub fn millis_to_ticks(&self, millis: u32) -> u32 {
        backend_api::millis_to_ticks(millis, self.backend.tick_micros())
    }

    /// Returns the duration of one backend clock tick in microseconds.
    pub fn ticks_to_micros(&self) -> u32 {
        self.backend.tick_micros()
    }
}
