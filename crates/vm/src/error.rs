//! Runtime error types.

use std::fmt;

/// Why execution stopped early.
///
/// Division by zero and unparsable input are *not* here: the VM reports
/// those on the error channel and continues with a zero value. `Internal`
/// means the program artifact was malformed, which the compiler's gating
/// is supposed to make impossible.
#[derive(Debug)]
pub enum RuntimeError {
    /// The host's cancellation flag was observed at an instruction boundary.
    Cancelled,
    /// Malformed program: stack underflow, unknown variable, bad constant
    /// index, or an unresolved jump. A compiler bug, not a user error.
    Internal(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Cancelled => write!(f, "execution cancelled"),
            RuntimeError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}
