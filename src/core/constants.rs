//! Numeric constants shared by the engine and the validation checks.

/// Constants for amplitude arithmetic and default sizing.
pub mod dj_constants {
    /// 1/√2, the Hadamard matrix entry.
    pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
    /// Allowed deviation of the squared norm from 1.
    pub const NORM_TOLERANCE: f64 = 1e-9;
    /// Probabilities below this are treated as exactly zero.
    pub const AMPLITUDE_TOLERANCE: f64 = 1e-12;
    /// Default cap on simultaneously live qubits (2^20 amplitudes).
    pub const DEFAULT_MAX_QUBITS: usize = 20;
    /// Hard ceiling on any configured cap: 2^30 amplitudes, 16 GiB.
    pub const MAX_SUPPORTED_QUBITS: usize = 30;
    /// Register width used by the stock suite.
    pub const DEFAULT_REGISTER_SIZE: usize = 10;
}
