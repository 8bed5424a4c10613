//! Bridge error types.
//!
//! Errors never cross the bridge as Rust control flow. They are produced
//! internally as [`BridgeError`] and turned into a diagnostic value that is
//! written into the caller's exception slot.

use crate::ValueKind;

/// The conceptual category of a bridge failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value of the wrong kind was passed where a constrained kind was required
    InvalidArgumentKind,
    /// The target of a property or call operation is not an object
    NotAnObject,
    /// The named property does not exist
    PropertyNotFound,
    /// The target or the resolved property cannot be called
    NotCallable,
    /// The target cannot be used as a constructor
    NotConstructible,
    /// The callee itself raised an exception
    CalleeRaised,
    /// String or array creation failed under resource exhaustion
    AllocationFailure,
    /// The handle refers to an entry that has already been destroyed
    DeadHandle,
}

impl ErrorKind {
    /// The script-visible error constructor name for this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::NotCallable.error_name(), "TypeError");
    /// assert_eq!(ErrorKind::PropertyNotFound.error_name(), "ReferenceError");
    /// ```
    pub fn error_name(self) -> &'static str {
        match self {
            ErrorKind::PropertyNotFound => "ReferenceError",
            ErrorKind::AllocationFailure => "RangeError",
            ErrorKind::CalleeRaised | ErrorKind::DeadHandle => "Error",
            _ => "TypeError",
        }
    }
}

/// A failure detected by the bridge itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// Wrong value kind for a constrained parameter
    #[error("{what} must be {expected}, got {got}")]
    InvalidArgumentKind {
        /// Which parameter was wrong
        what: &'static str,
        /// Accepted kinds, for the message
        expected: &'static str,
        /// Kind actually supplied
        got: ValueKind,
    },

    /// Operation target is not an object
    #[error("{operation} called on non-object {got}")]
    NotAnObject {
        /// Operation name
        operation: &'static str,
        /// Kind actually supplied
        got: ValueKind,
    },

    /// Missing property
    #[error("property '{0}' is not defined")]
    PropertyNotFound(String),

    /// Target is not callable
    #[error("{0} is not a function")]
    NotCallable(String),

    /// Target is not a constructor
    #[error("{0} is not a constructor")]
    NotConstructible(String),

    /// Allocation refused
    #[error("cannot allocate {bytes} bytes for {what}")]
    AllocationFailure {
        /// What was being allocated
        what: &'static str,
        /// Requested size
        bytes: usize,
    },

    /// Handle already destroyed
    #[error("handle {0} has already been released")]
    DeadHandle(crate::VarId),

    /// A callee reported a failure without supplying an exception value
    #[error("{0}")]
    Callee(String),
}

impl BridgeError {
    /// The conceptual kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::InvalidArgumentKind { .. } => ErrorKind::InvalidArgumentKind,
            BridgeError::NotAnObject { .. } => ErrorKind::NotAnObject,
            BridgeError::PropertyNotFound(_) => ErrorKind::PropertyNotFound,
            BridgeError::NotCallable(_) => ErrorKind::NotCallable,
            BridgeError::NotConstructible(_) => ErrorKind::NotConstructible,
            BridgeError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            BridgeError::DeadHandle(_) => ErrorKind::DeadHandle,
            BridgeError::Callee(_) => ErrorKind::CalleeRaised,
        }
    }

    /// Full diagnostic text, prefixed by the error name.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::BridgeError;
    ///
    /// let err = BridgeError::NotCallable("'f'".to_string());
    /// assert_eq!(err.diagnostic(), "TypeError: 'f' is not a function");
    /// ```
    pub fn diagnostic(&self) -> String {
        format!("{}: {}", self.kind().error_name(), self)
    }
}

/// Result type for operations that fail with a [`BridgeError`]
pub type BridgeResult<T> = Result<T, BridgeError>;
