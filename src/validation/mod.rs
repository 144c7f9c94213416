// src/validation/mod.rs

//! Checks on an [`AmplitudeState`]: normalisation, ground state, and
//! whether a simulator still holds qubits after a run.

use crate::core::{AmplitudeState, DjError, Result, AMPLITUDE_TOLERANCE, NORM_TOLERANCE};
use crate::simulation::Simulator;

/// Checks that the squared amplitudes sum to 1 within `tolerance`
/// (defaults to `NORM_TOLERANCE`).
///
/// # Returns
/// * `Ok(())` if normalised.
/// * `Err(DjError::InvariantViolation)` otherwise; every gate is unitary, so a
///   drift means the engine itself is broken.
pub fn check_normalization(state: &AmplitudeState, tolerance: Option<f64>) -> Result<()> {
    let effective_tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let norm_sq: f64 = state.vector().iter().map(|c| c.norm_sqr()).sum();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(DjError::invariant(format!(
            "State vector normalization failed. Sum(|c_i|^2) = {} (Deviation > {})",
            norm_sq, effective_tolerance
        )))
    } else {
        Ok(())
    }
}

/// Checks that the state is the all-zero basis state |0...0> up to a global
/// phase.
pub fn check_zero_state(state: &AmplitudeState) -> Result<()> {
    let residual: f64 = state.vector().iter().skip(1).map(|c| c.norm_sqr()).sum();
    if residual > AMPLITUDE_TOLERANCE {
        return Err(DjError::invariant(format!(
            "State is not |0...0>: {:.3e} probability outside the ground state",
            residual
        )));
    }
    Ok(())
}

/// Checks that a simulator has no live qubits left, i.e. every register
/// acquired during a run was released.
pub fn check_no_leaked_qubits(simulator: &Simulator) -> Result<()> {
    let live = simulator.live_ids();
    if !live.is_empty() {
        return Err(DjError::invariant(format!("{} qubit(s) still allocated: {:?}", live.len(), live)));
    }
    check_normalization(simulator.state(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use num_traits::Zero;

    #[test]
    fn unnormalised_state_is_rejected() {
        let state = AmplitudeState::new(vec![Complex::new(1.0, 0.0), Complex::new(1.0, 0.0)]);
        assert!(check_normalization(&state, None).is_err());
        assert!(check_normalization(&state, Some(1.5)).is_ok());
    }

    #[test]
    fn zero_state_accepts_global_phase() {
        let state = AmplitudeState::new(vec![Complex::new(-1.0, 0.0), Complex::zero()]);
        assert!(check_zero_state(&state).is_ok());
        let excited = AmplitudeState::new(vec![Complex::zero(), Complex::new(1.0, 0.0)]);
        assert!(check_zero_state(&excited).is_err());
    }
}
