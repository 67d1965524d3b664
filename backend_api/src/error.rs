//! Backend error types.

use thiserror::Error;

/// Outcome vocabulary for every fallible backend primitive.
///
/// The abstraction layer never assumes more about a kernel than this:
/// an operation succeeded, ran out of time, or failed. Timed waits report
/// expiry as [`BackendError::Timeout`]; a full queue rejects a send the
/// same way, since the send is a zero-timeout wait for space. Everything
/// else is [`BackendError::Failure`], mapped by the caller into its own
/// taxonomy.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The operation's time bound expired before it could complete.
    #[error("backend operation timed out")]
    Timeout,

    /// The backend rejected or could not complete the operation.
    #[error("backend operation failed")]
    Failure,
}
