//! Errors raised by the value engine.
//!
//! Every failure is surfaced to the caller immediately; nothing here is
//! retried or swallowed. Factory functions are the public way to build
//! errors; they fill in both the structured [`ErrorKind`] and the message.

use std::fmt;

use cinder_ir::ParseError;
use cinder_types::LayoutError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed type expression, element-count mismatch, bad enum value.
    #[error("{message}")]
    Argument { message: String },
    /// Operand of the wrong kind. `position` is 1-based.
    #[error("{op}: expected {expected} for argument {position}, got {got}")]
    Type {
        op: &'static str,
        expected: &'static str,
        position: usize,
        got: String,
    },
    #[error("{op}: index {index} out of bounds for length {len}")]
    Bounds {
        op: &'static str,
        index: i128,
        len: usize,
    },
    #[error("out of memory allocating {bytes} bytes")]
    Memory { bytes: usize },
    #[error("{op}: division by zero")]
    DivideByZero { op: &'static str },
    /// A handle whose object was reclaimed by a collection.
    #[error("object handle is no longer live")]
    StaleHandle,
    #[error("{op}: {message}")]
    Io { op: &'static str, message: String },
}

/// Value engine error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    fn from_kind(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        EngineError { kind, message }
    }

    pub fn is_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::Argument { .. })
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, ErrorKind::Type { .. })
    }

    pub fn is_bounds(&self) -> bool {
        matches!(self.kind, ErrorKind::Bounds { .. })
    }

    pub fn is_divide_by_zero(&self) -> bool {
        matches!(self.kind, ErrorKind::DivideByZero { .. })
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}

impl From<ErrorKind> for EngineError {
    fn from(kind: ErrorKind) -> Self {
        EngineError::from_kind(kind)
    }
}

impl From<LayoutError> for EngineError {
    fn from(err: LayoutError) -> Self {
        argument_error(err.to_string())
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        argument_error(err.to_string())
    }
}

#[cold]
pub fn argument_error(message: impl Into<String>) -> EngineError {
    EngineError::from_kind(ErrorKind::Argument {
        message: message.into(),
    })
}

#[cold]
pub fn type_error(
    op: &'static str,
    expected: &'static str,
    position: usize,
    got: impl Into<String>,
) -> EngineError {
    EngineError::from_kind(ErrorKind::Type {
        op,
        expected,
        position,
        got: got.into(),
    })
}

#[cold]
pub fn bounds_error(op: &'static str, index: i128, len: usize) -> EngineError {
    EngineError::from_kind(ErrorKind::Bounds { op, index, len })
}

#[cold]
pub fn memory_error(bytes: usize) -> EngineError {
    EngineError::from_kind(ErrorKind::Memory { bytes })
}

#[cold]
pub fn divide_by_zero(op: &'static str) -> EngineError {
    EngineError::from_kind(ErrorKind::DivideByZero { op })
}

#[cold]
pub fn stale_handle() -> EngineError {
    EngineError::from_kind(ErrorKind::StaleHandle)
}

#[cold]
pub fn io_error(op: &'static str, err: &std::io::Error) -> EngineError {
    EngineError::from_kind(ErrorKind::Io {
        op,
        message: err.to_string(),
    })
}
