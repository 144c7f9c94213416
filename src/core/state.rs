// src/core/state.rs

use num_complex::Complex;
use std::fmt;

/// Amplitude vector of every live qubit in a backend, indexed by basis state.
///
/// Bit `p` of a basis index is the value of the qubit at position `p` in the
/// backend's ordering, so the dimension is always `2^live_qubits`. With no
/// live qubits the state is the scalar `[1]`.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct AmplitudeState {
    amplitudes: Vec<Complex<f64>>,
}

impl AmplitudeState {
    /// The empty-register state `[1]`.
    pub(crate) fn vacuum() -> Self {
        Self { amplitudes: vec![Complex::new(1.0, 0.0)] }
    }

    /// Wraps a raw vector. The caller is responsible for the dimension being
    /// a power of two; normalisation is checked by `validation`.
    pub(crate) fn new(amplitudes: Vec<Complex<f64>>) -> Self {
        Self { amplitudes }
    }

    /// Provides read-only access to the amplitudes.
    pub fn vector(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    pub(crate) fn vector_mut(&mut self) -> &mut Vec<Complex<f64>> {
        &mut self.amplitudes
    }

    /// Number of basis states represented.
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Probability that the qubit at `position` reads 1.
    pub fn probability_of_one(&self, position: usize) -> f64 {
        let mask = 1usize << position;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(k, _)| k & mask != 0)
            .map(|(_, c)| c.norm_sqr())
            .sum()
    }
}

impl fmt::Display for AmplitudeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amplitudes[")?;
        for (i, c) in self.amplitudes.iter().enumerate() {
            write!(f, "{}{:.4}", if i > 0 { ", " } else { "" }, c)?;
        }
        write!(f, "]")
    }
}

/// Classical value read out of a qubit by a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Zero,
    One,
}

impl Outcome {
    pub fn is_one(self) -> bool {
        matches!(self, Outcome::One)
    }

    pub fn as_bit(self) -> u8 {
        match self {
            Outcome::Zero => 0,
            Outcome::One => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bit())
    }
}

/// Result of one Deutsch-Jozsa run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Same output for every input.
    Constant,
    /// Output 0 for exactly half of the inputs.
    Balanced,
}

impl Classification {
    pub fn is_constant(self) -> bool {
        matches!(self, Classification::Constant)
    }

    /// Maps the `true = constant` convention onto the enum.
    pub fn from_constant(constant: bool) -> Self {
        if constant { Classification::Constant } else { Classification::Balanced }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Constant => write!(f, "constant"),
            Classification::Balanced => write!(f, "balanced"),
        }
    }
}
