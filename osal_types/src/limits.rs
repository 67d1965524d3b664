//! Capacity limits for the object tables.
//!
//! Every table has a fixed, compile-time capacity; slot indices are
//! bounded by the per-kind constant. The limits match the configuration
//! the abstraction layer has always shipped with.

/// Maximum object name length in bytes. Names of `MAX_NAME` bytes or
/// longer are rejected at creation and lookup, so the longest valid name
/// is `MAX_NAME - 1` bytes.
pub const MAX_NAME: usize = 20;

/// Capacity of the task table.
pub const MAX_TASKS: usize = 64;

/// Capacity of the message queue table.
pub const MAX_QUEUES: usize = 64;

/// Capacity of the binary semaphore table.
pub const MAX_BIN_SEMAPHORES: usize = 20;

/// Capacity of the counting semaphore table.
pub const MAX_COUNT_SEMAPHORES: usize = 20;

/// Capacity of the mutex table.
pub const MAX_MUTEXES: usize = 20;

/// Capacity of the timer table.
pub const MAX_TIMERS: usize = 20;

/// Highest task priority accepted by task creation.
pub const MAX_PRIORITY: u32 = 255;

/// Highest initial value accepted for a counting semaphore.
pub const MAX_SEM_VALUE: u32 = 0x7FFF_FFFF;
