//! The kernel backend trait.

use crate::BackendError;
use osal_types::NativeHandle;
use std::sync::Arc;

/// Entry point of a task.
pub type TaskEntry = fn();

/// Callback invoked by the backend when a timer expires.
///
/// The callback is opaque to the abstraction layer: it is stored at timer
/// creation and handed to the backend when the timer is armed. It must be
/// shareable because the backend may fire it from its own context while
/// the layer still holds a reference.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// How long a queue receive may wait for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueWait {
    /// Block until a message arrives.
    Pend,
    /// Poll: return immediately whether or not a message is present.
    Check,
    /// Wait up to the given number of milliseconds.
    Millis(u32),
}

/// Result of signalling a semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The count was incremented (or a waiter was released).
    Signaled,
    /// The semaphore was already at its maximum count; nothing was
    /// waiting and nothing changed. Repeated signalling of a bounded
    /// semaphore must eventually report this, which is what guarantees
    /// that a flush loop terminates.
    Saturated,
}

/// The kernel backend interface.
///
/// This is the boundary between the portable layer and a concrete kernel.
/// Implementations exist for testing (an in-process simulator) and for
/// real kernels (thin shims over native primitives). The layer calls
/// these primitives outside its own table locks, so an implementation is
/// free to block in `wait`-shaped operations.
///
/// # Handles
///
/// Every create-shaped primitive returns a [`NativeHandle`] that only the
/// issuing backend can interpret. Passing a handle from one backend to
/// another is a caller bug and reports [`BackendError::Failure`].
///
/// # Interrupt context
///
/// `sem_signal` and `queue_send` must be callable from interrupt/handler
/// context. No other primitive carries that capability; the wait-shaped
/// primitives never do.
pub trait KernelBackend: Send + Sync {
    // ----- tasks -----

    /// Creates a task in the dormant state.
    fn task_create(
        &self,
        entry: TaskEntry,
        stack_size: u32,
        priority: u32,
    ) -> Result<NativeHandle, BackendError>;

    /// Makes a created task ready for scheduling.
    fn task_activate(&self, task: NativeHandle) -> Result<(), BackendError>;

    /// Destroys a task.
    fn task_delete(&self, task: NativeHandle) -> Result<(), BackendError>;

    /// Changes a task's priority.
    fn task_set_priority(&self, task: NativeHandle, priority: u32) -> Result<(), BackendError>;

    /// Terminates the calling task.
    fn task_exit(&self) -> Result<(), BackendError>;

    /// Suspends the calling task for the given number of milliseconds.
    fn task_sleep(&self, millis: u32) -> Result<(), BackendError>;

    /// Returns the handle of the currently running task, if the backend
    /// can attribute the calling context to one.
    fn current_task(&self) -> Option<NativeHandle>;

    // ----- message queues -----

    /// Creates a queue able to hold `capacity_bytes` of queued data.
    fn queue_create(&self, capacity_bytes: u32) -> Result<NativeHandle, BackendError>;

    /// Destroys a queue; queued messages are discarded.
    fn queue_delete(&self, queue: NativeHandle) -> Result<(), BackendError>;

    /// Appends a message without waiting. A full queue reports
    /// [`BackendError::Timeout`]. Callable from interrupt context.
    fn queue_send(&self, queue: NativeHandle, data: &[u8]) -> Result<(), BackendError>;

    /// Removes the oldest message into `buffer`, waiting per `wait`.
    /// Returns the number of bytes copied. Expiry (or an empty queue
    /// under [`QueueWait::Check`]) reports [`BackendError::Timeout`].
    fn queue_receive(
        &self,
        queue: NativeHandle,
        buffer: &mut [u8],
        wait: QueueWait,
    ) -> Result<usize, BackendError>;

    // ----- semaphores -----

    /// Creates a semaphore with the given initial and maximum counts.
    fn sem_create(&self, initial: u32, max: u32) -> Result<NativeHandle, BackendError>;

    /// Destroys a semaphore.
    fn sem_delete(&self, sem: NativeHandle) -> Result<(), BackendError>;

    /// Signals a semaphore. Callable from interrupt context.
    fn sem_signal(&self, sem: NativeHandle) -> Result<SignalOutcome, BackendError>;

    /// Waits on a semaphore with no time bound.
    fn sem_wait(&self, sem: NativeHandle) -> Result<(), BackendError>;

    /// Waits on a semaphore for at most `millis` milliseconds.
    fn sem_timed_wait(&self, sem: NativeHandle, millis: u32) -> Result<(), BackendError>;

    // ----- mutexes -----

    /// Creates a mutex.
    fn mutex_create(&self) -> Result<NativeHandle, BackendError>;

    /// Destroys a mutex.
    fn mutex_delete(&self, mutex: NativeHandle) -> Result<(), BackendError>;

    /// Acquires a mutex, blocking until it is available.
    fn mutex_lock(&self, mutex: NativeHandle) -> Result<(), BackendError>;

    /// Releases a mutex held by the calling task.
    fn mutex_unlock(&self, mutex: NativeHandle) -> Result<(), BackendError>;

    // ----- timers -----

    /// Creates and starts a timer: `callback` fires after `start_micros`,
    /// then every `interval_micros` (zero interval means one-shot).
    /// `start_micros` is non-zero; an unarmed timer has no backend object.
    fn timer_arm(
        &self,
        callback: TimerCallback,
        start_micros: u64,
        interval_micros: u64,
    ) -> Result<NativeHandle, BackendError>;

    /// Stops a timer from firing; the timer object remains.
    fn timer_cancel(&self, timer: NativeHandle) -> Result<(), BackendError>;

    /// Destroys a timer object.
    fn timer_destroy(&self, timer: NativeHandle) -> Result<(), BackendError>;

    // ----- clock -----

    /// Returns the backend's monotonic time in microseconds.
    fn now_micros(&self) -> Result<u64, BackendError>;

    /// Returns the fixed duration of one backend clock tick in
    /// microseconds.
    fn tick_micros(&self) -> u32;

    /// Returns the finest timer resolution in microseconds. Timer start
    /// and interval values below this are rounded up to it.
    fn clock_accuracy_micros(&self) -> u64;
}
