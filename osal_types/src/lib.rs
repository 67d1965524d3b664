//! # OSAL Types
//!
//! This crate defines the fundamental types shared by the abstraction
//! layer and its kernel backends.
//!
//! ## Philosophy
//!
//! - **Identifiers are positions, not secrets**: an object id is its slot
//!   index in a fixed-capacity table, paired with a generation counter so
//!   a stale id from a deleted object is detected instead of aliasing the
//!   slot's next occupant.
//! - **One id type per object kind**: a [`QueueId`] cannot be passed where
//!   a [`TaskId`] is expected.
//! - **Names are bounded**: [`ObjectName`] enforces the byte-length limit
//!   at construction, so a name that exists is always storable.
//!
//! ## Key Types
//!
//! - [`TaskId`], [`QueueId`], [`BinSemId`], [`CountSemId`], [`MutexId`],
//!   [`TimerId`]: per-kind object identifiers
//! - [`NativeHandle`]: opaque reference to a backend kernel object
//! - [`ObjectName`]: bounded, byte-for-byte-compared object name

pub mod ids;
pub mod limits;
pub mod name;

pub use ids::{BinSemId, CountSemId, MutexId, NativeHandle, QueueId, RawId, TaskId, TimerId};
pub use name::{NameError, ObjectName};
