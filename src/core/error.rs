//! Error handling logic

use std::fmt;
use thiserror::Error;

/// Unique identifier for a simulated qubit.
/// Identifiers are handed out by a backend on allocation and are never
/// reused within the lifetime of that backend, so a stale id held after
/// release can always be told apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub u64);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q({})", self.0)
    }
}

/// Failures raised by a backend, a register or an oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DjError {
    /// The backend cannot provide the requested number of qubits.
    /// Fatal to the running test case only.
    #[error("Resource exhausted: requested {requested} qubit(s), {available} available")]
    ResourceExhausted {
        /// Qubits asked for by the caller
        requested: usize,
        /// Qubits still free under the configured cap
        available: usize,
    },

    /// The register/oracle lifecycle contract was broken: double release,
    /// use after release, or releasing a qubit that still carries state.
    /// Indicates a programming defect rather than a recoverable condition.
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// InvariantViolation failure message
        message: String,
    },

    /// A qubit id was passed that the backend does not know (never allocated
    /// or already released).
    #[error("Unknown qubit {qubit}")]
    UnknownQubit {
        /// The offending id
        qubit: QubitId,
    },

    /// An operation is inconsistent with the current state (bad oracle
    /// parameter, empty allocation, control equal to target, ...).
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// InvalidOperation failure message
        message: String,
    },
}

impl DjError {
    /// Shorthand used across the crate for lifecycle defects.
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        DjError::InvariantViolation { message: message.into() }
    }

    /// Shorthand for parameter and state mismatches.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DjError::InvalidOperation { message: message.into() }
    }

    /// `true` for the error kinds that must abort the process instead of
    /// being recovered at a test-case boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DjError::InvariantViolation { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DjError>;
