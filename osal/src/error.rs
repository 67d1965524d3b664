//! The abstraction layer's error taxonomy.
//!
//! Every operation reports failure through [`OsalError`]; nothing aborts
//! the process. Each member carries a stable numeric code and a bounded
//! display name so embedding code that logs raw codes can render them.

use osal_types::NameError;
use thiserror::Error;

/// Display name reported for a code outside the taxonomy.
pub const UNKNOWN_ERROR_NAME: &str = "ERR_UNKNOWN";

/// Errors reported by the abstraction layer.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum OsalError {
    /// A backend call failed for a reason the layer does not classify.
    #[error("backend call failed")]
    GenericError,

    /// A required reference was null. Unreachable from safe Rust; kept so
    /// the taxonomy and its name map stay complete for embedders.
    #[error("a required reference was null")]
    InvalidPointer,

    /// A semaphore or mutex operation failed in the backend.
    #[error("semaphore operation failed")]
    SemFailure,

    /// A bounded semaphore wait expired.
    #[error("semaphore wait timed out")]
    SemTimeout,

    /// A polled queue had no message.
    #[error("queue is empty")]
    QueueEmpty,

    /// The queue could not accept another message.
    #[error("queue is full")]
    QueueFull,

    /// A bounded queue receive expired.
    #[error("queue receive timed out")]
    QueueTimeout,

    /// The receive buffer is smaller than the queue's configured item
    /// size; accepting it could silently truncate a message.
    #[error("receive buffer is smaller than the queue's item size")]
    QueueInvalidSize,

    /// The object name does not fit in a table slot.
    #[error("object name is too long")]
    NameTooLong,

    /// Every slot in the table is occupied.
    #[error("no free slots left in the table")]
    NoFreeIds,

    /// An occupied slot in the table already carries this name.
    #[error("object name is already in use")]
    NameTaken,

    /// The identifier is out of range, stale, or its slot is free.
    #[error("identifier does not refer to a live object")]
    InvalidId,

    /// No occupied slot carries the requested name.
    #[error("object name was not found")]
    NameNotFound,

    /// The task priority exceeds the allowed maximum.
    #[error("task priority is out of range")]
    InvalidPriority,

    /// The counting semaphore initial value exceeds the allowed maximum.
    #[error("semaphore initial value is out of range")]
    InvalidSemValue,

    /// The timer arguments are invalid. Unreachable from safe Rust (a
    /// callback cannot be null); kept for taxonomy completeness.
    #[error("timer arguments are invalid")]
    TimerInvalidArgs,

    /// A backend timer operation (arm, cancel, destroy) failed.
    #[error("backend timer operation failed")]
    TimerErrInternal,
}

impl OsalError {
    /// Returns the stable numeric code for this error.
    pub fn code(&self) -> i32 {
        match self {
            OsalError::GenericError => -1,
            OsalError::InvalidPointer => -2,
            OsalError::SemFailure => -3,
            OsalError::SemTimeout => -4,
            OsalError::QueueEmpty => -5,
            OsalError::QueueFull => -6,
            OsalError::QueueTimeout => -7,
            OsalError::QueueInvalidSize => -8,
            OsalError::NameTooLong => -9,
            OsalError::NoFreeIds => -10,
            OsalError::NameTaken => -11,
            OsalError::InvalidId => -12,
            OsalError::NameNotFound => -13,
            OsalError::InvalidPriority => -14,
            OsalError::InvalidSemValue => -15,
            OsalError::TimerInvalidArgs => -16,
            OsalError::TimerErrInternal => -17,
        }
    }

    /// Returns the bounded display name for this error.
    pub fn name(&self) -> &'static str {
        match self {
            OsalError::GenericError => "GENERIC_ERROR",
            OsalError::InvalidPointer => "INVALID_POINTER",
            OsalError::SemFailure => "SEM_FAILURE",
            OsalError::SemTimeout => "SEM_TIMEOUT",
            OsalError::QueueEmpty => "QUEUE_EMPTY",
            OsalError::QueueFull => "QUEUE_FULL",
            OsalError::QueueTimeout => "QUEUE_TIMEOUT",
            OsalError::QueueInvalidSize => "QUEUE_INVALID_SIZE",
            OsalError::NameTooLong => "NAME_TOO_LONG",
            OsalError::NoFreeIds => "NO_FREE_IDS",
            OsalError::NameTaken => "NAME_TAKEN",
            OsalError::InvalidId => "INVALID_ID",
            OsalError::NameNotFound => "NAME_NOT_FOUND",
            OsalError::InvalidPriority => "INVALID_PRIORITY",
            OsalError::InvalidSemValue => "INVALID_SEM_VALUE",
            OsalError::TimerInvalidArgs => "TIMER_INVALID_ARGS",
            OsalError::TimerErrInternal => "TIMER_ERR_INTERNAL",
        }
    }

    /// Resolves a numeric code back to its taxonomy member.
    pub fn from_code(code: i32) -> Option<OsalError> {
        match code {
            -1 => Some(OsalError::GenericError),
            -2 => Some(OsalError::InvalidPointer),
            -3 => Some(OsalError::SemFailure),
            -4 => Some(OsalError::SemTimeout),
            -5 => Some(OsalError::QueueEmpty),
            -6 => Some(OsalError::QueueFull),
            -7 => Some(OsalError::QueueTimeout),
            -8 => Some(OsalError::QueueInvalidSize),
            -9 => Some(OsalError::NameTooLong),
            -10 => Some(OsalError::NoFreeIds),
            -11 => Some(OsalError::NameTaken),
            -12 => Some(OsalError::InvalidId),
            -13 => Some(OsalError::NameNotFound),
            -14 => Some(OsalError::InvalidPriority),
            -15 => Some(OsalError::InvalidSemValue),
            -16 => Some(OsalError::TimerInvalidArgs),
            -17 => Some(OsalError::TimerErrInternal),
            _ => None,
        }
    }
}

impl From<NameError> for OsalError {
    fn from(err: NameError) -> Self {
        match err {
            NameError::TooLong(_) => OsalError::NameTooLong,
        }
    }
}

/// Mapping failure for a code outside the taxonomy.
///
/// Distinct from every [`OsalError`] member: the failure belongs to the
/// name lookup itself, not to the operation that produced the code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized error code {code}, reported as {UNKNOWN_ERROR_NAME}")]
pub struct UnknownErrorCode {
    /// The code that could not be mapped.
    pub code: i32,
}

/// Maps a numeric result code to its bounded display name.
///
/// Total over the taxonomy: every member's code and the success code map
/// to a name; anything else reports [`UnknownErrorCode`], whose display
/// carries the [`UNKNOWN_ERROR_NAME`] sentinel.
pub fn error_name(code: i32) -> Result<&'static str, UnknownErrorCode> {
    if code == 0 {
        return Ok("SUCCESS");
    }
    OsalError::from_code(code)
        .map(|err| err.name())
        .ok_or(UnknownErrorCode { code })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OsalError; 17] = [
        OsalError::GenericError,
        OsalError::InvalidPointer,
        OsalError::SemFailure,
        OsalError::SemTimeout,
        OsalError::QueueEmpty,
        OsalError::QueueFull,
        OsalError::QueueTimeout,
        OsalError::QueueInvalidSize,
        OsalError::NameTooLong,
        OsalError::NoFreeIds,
        OsalError::NameTaken,
        OsalError::InvalidId,
        OsalError::NameNotFound,
        OsalError::InvalidPriority,
        OsalError::InvalidSemValue,
        OsalError::TimerInvalidArgs,
        OsalError::TimerErrInternal,
    ];

    #[test]
    fn test_every_member_round_trips_through_its_code() {
        for err in ALL {
            assert_eq!(OsalError::from_code(err.code()), Some(err));
            assert_eq!(error_name(err.code()), Ok(err.name()));
        }
    }

    #[test]
    fn test_codes_and_names_are_distinct() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn test_success_code_is_named() {
        assert_eq!(error_name(0), Ok("SUCCESS"));
    }

    #[test]
    fn test_unknown_code_is_a_mapping_failure() {
        let err = error_name(-999).unwrap_err();
        assert_eq!(err.code, -999);
        assert!(err.to_string().contains(UNKNOWN_ERROR_NAME));
    }

    #[test]
    fn test_name_too_long_conversion() {
        let err = NameError::TooLong(40);
        assert_eq!(OsalError::from(err), OsalError::NameTooLong);
    }
}
