//! Object identifiers.
//!
//! An identifier is a slot index into a fixed-capacity table plus the
//! slot's generation at the time the object was created. The index is the
//! externally meaningful position (tables hand out the lowest free index,
//! and an index is reused after its object is deleted); the generation
//! lets a table reject an id that outlived its object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind-agnostic identifier carried by every per-kind id type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawId {
    index: u32,
    generation: u32,
}

impl RawId {
    /// Creates an identifier from its parts.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the slot generation this id was minted under.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Opaque reference to a kernel object owned by the backend.
///
/// The abstraction layer stores these but never interprets them; only the
/// backend that minted a handle can resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wraps a raw backend handle value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Native({})", self.0)
    }
}

/// Identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(RawId);

impl TaskId {
    /// Returns the table slot index.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Returns the underlying raw id.
    pub fn raw(&self) -> RawId {
        self.0
    }
}

impl From<RawId> for TaskId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({}#{})", self.0.index(), self.0.generation())
    }
}

/// Identifier for a message queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueId(RawId);

impl QueueId {
    /// Returns the table slot index.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Returns the underlying raw id.
    pub fn raw(&self) -> RawId {
        self.0
    }
}

impl From<RawId> for QueueId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue({}#{})", self.0.index(), self.0.generation())
    }
}

/// Identifier for a binary semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinSemId(RawId);

impl BinSemId {
    /// Returns the table slot index.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Returns the underlying raw id.
    pub fn raw(&self) -> RawId {
        self.0
    }
}

impl From<RawId> for BinSemId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BinSemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinSem({}#{})", self.0.index(), self.0.generation())
    }
}

/// Identifier for a counting semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountSemId(RawId);

impl CountSemId {
    /// Returns the table slot index.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Returns the underlying raw id.
    pub fn raw(&self) -> RawId {
        self.0
    }
}

impl From<RawId> for CountSemId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CountSemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountSem({}#{})", self.0.index(), self.0.generation())
    }
}

/// Identifier for a mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutexId(RawId);

impl MutexId {
    /// Returns the table slot index.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Returns the underlying raw id.
    pub fn raw(&self) -> RawId {
        self.0
    }
}

impl From<RawId> for MutexId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MutexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutex({}#{})", self.0.index(), self.0.generation())
    }
}

/// Identifier for a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(RawId);

impl TimerId {
    /// Returns the table slot index.
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    /// Returns the underlying raw id.
    pub fn raw(&self) -> RawId {
        self.0
    }
}

impl From<RawId> for TimerId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({}#{})", self.0.index(), self.0.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_id_parts() {
        let raw = RawId::new(3, 7);
        assert_eq!(raw.index(), 3);
        assert_eq!(raw.generation(), 7);
    }

    #[test]
    fn test_same_index_different_generation() {
        let first = TaskId::from(RawId::new(2, 0));
        let reused = TaskId::from(RawId::new(2, 1));

        assert_eq!(first.index(), reused.index());
        assert_ne!(first, reused);
    }

    #[test]
    fn test_id_display() {
        let id = QueueId::from(RawId::new(4, 2));
        assert_eq!(id.to_string(), "Queue(4#2)");

        let id = TimerId::from(RawId::new(0, 0));
        assert_eq!(id.to_string(), "Timer(0#0)");
    }

    #[test]
    fn test_native_handle_round_trip() {
        let handle = NativeHandle::new(42);
        assert_eq!(handle.raw(), 42);
        assert_eq!(handle.to_string(), "Native(42)");
    }
}
