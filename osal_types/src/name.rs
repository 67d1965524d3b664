//! Bounded object names.

use crate::limits::MAX_NAME;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error produced when constructing an [`ObjectName`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// The name does not fit in a table slot.
    #[error("name is {0} bytes, the longest storable name is {limit} bytes", limit = MAX_NAME - 1)]
    TooLong(usize),
}

/// A bounded object name.
///
/// Names identify objects within one table and must be unique there.
/// Comparison is byte-for-byte; no normalization is applied. A name of
/// `MAX_NAME` bytes or more is rejected rather than truncated, since a
/// truncated pair of distinct names could collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectName(String);

impl ObjectName {
    /// Validates and wraps a name.
    pub fn new(name: &str) -> Result<Self, NameError> {
        if name.len() >= MAX_NAME {
            return Err(NameError::TooLong(name.len()));
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the name is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
