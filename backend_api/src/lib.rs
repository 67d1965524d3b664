//! # Backend API
//!
//! This crate defines the interface between the abstraction layer and the
//! kernel that actually schedules tasks and implements synchronization.
//!
//! ## Philosophy
//!
//! The backend provides **primitives**, not policy:
//! - create/destroy for every object kind
//! - signal/wait/timed-wait with a tri-state outcome
//! - a current-task accessor so the layer can attribute object creation
//!
//! ## Design Goals
//!
//! 1. **Testability**: the entire trait can be implemented in-process
//! 2. **Minimal vocabulary**: success, timeout, or failure; nothing
//!    kernel-specific leaks through
//! 3. **No blocking under locks**: the layer calls blocking primitives
//!    only outside its own critical sections
//!
//! ## Non-Goals
//!
//! This is NOT a scheduler, a wait-queue implementation, or a syscall
//! layer. Multiple implementations are possible: a simulated backend for
//! tests, or a thin shim over a real kernel.

pub mod backend;
pub mod error;
pub mod time;

pub use backend::{KernelBackend, QueueWait, SignalOutcome, TaskEntry, TimerCallback};
pub use error::BackendError;
pub use time::millis_to_ticks;
