// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod state;

// Re-export public types for convenient access via `dj_oracle::core::TypeName`
pub use error::{DjError, QubitId, Result};
pub use state::{AmplitudeState, Classification, Outcome};

pub mod constants;
pub use constants::dj_constants::{
    AMPLITUDE_TOLERANCE, DEFAULT_MAX_QUBITS, DEFAULT_REGISTER_SIZE, FRAC_1_SQRT_2, MAX_SUPPORTED_QUBITS,
    NORM_TOLERANCE,
};
