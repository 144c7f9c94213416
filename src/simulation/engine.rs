// src/simulation/engine.rs
use crate::core::{AmplitudeState, DjError, Outcome, Result, AMPLITUDE_TOLERANCE, FRAC_1_SQRT_2};
use num_complex::Complex;
use num_traits::Zero; // For Complex::zero()
use tracing::debug;

/// Dense amplitude vector over the live qubits of a `Simulator`.
///
/// Qubits are addressed by *position*: bit `p` of a basis index is the value
/// of the qubit at position `p`. Allocation appends a new most-significant
/// position; removal compacts the positions above the removed one down by
/// one. Mapping ids to positions is the caller's job.
/// (Internal visibility)
#[derive(Debug, Clone)]
pub(crate) struct StateVectorEngine {
    global_state: AmplitudeState,
    num_qubits: usize,
}

impl StateVectorEngine {
    /// Engine with no qubits; the state is the scalar 1.
    pub(crate) fn new() -> Self {
        Self { global_state: AmplitudeState::vacuum(), num_qubits: 0 }
    }

    pub(crate) fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub(crate) fn state(&self) -> &AmplitudeState {
        &self.global_state
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: AmplitudeState) -> Result<()> {
        if state.dim() != self.global_state.dim() {
            return Err(DjError::invalid(format!(
                "Cannot set state: provided dimension {} does not match engine dimension {}",
                state.dim(),
                self.global_state.dim()
            )));
        }
        self.global_state = state;
        Ok(())
    }

    /// Reserves the amplitudes for `additional` more qubits in one go, so
    /// the `push_qubit` calls that follow never reallocate.
    ///
    /// Fails with `ResourceExhausted` (reporting 0 available) when the
    /// dimension overflows `usize` or the allocator refuses the memory.
    pub(crate) fn reserve_qubits(&mut self, additional: usize) -> Result<()> {
        let refused = || DjError::ResourceExhausted { requested: additional, available: 0 };
        let width = self
            .num_qubits
            .checked_add(additional)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(refused)?;
        let target_dim = 1usize.checked_shl(width).ok_or_else(refused)?;
        let vector = self.global_state.vector_mut();
        let extra = target_dim.saturating_sub(vector.len());
        vector.try_reserve_exact(extra).map_err(|e| {
            debug!(additional, target_dim, error = %e, "state vector reservation refused");
            refused()
        })
    }

    /// Tensors a fresh |0> onto the state as the new highest position and
    /// returns that position.
    pub(crate) fn push_qubit(&mut self) -> Result<usize> {
        let new_dim = 1usize
            .checked_shl(self.num_qubits as u32 + 1)
            .ok_or(DjError::ResourceExhausted { requested: 1, available: 0 })?;
        // |0> on the new top bit: the lower half keeps the old amplitudes.
        self.global_state.vector_mut().resize(new_dim, Complex::zero());
        self.num_qubits += 1;
        Ok(self.num_qubits - 1)
    }

    /// Removes the qubit at `position`, which must be in |0>.
    pub(crate) fn remove_qubit(&mut self, position: usize) -> Result<()> {
        self.check_position(position)?;
        let p_one = self.global_state.probability_of_one(position);
        if p_one > AMPLITUDE_TOLERANCE {
            return Err(DjError::invariant(format!(
                "qubit at position {} released with P(1) = {:.3e}; reset it first",
                position, p_one
            )));
        }

        let mask = 1usize << position;
        let lower_mask = mask - 1;
        let dim = self.global_state.dim();
        let mut new_vec = vec![Complex::zero(); dim / 2];
        for (i, slot) in new_vec.iter_mut().enumerate() {
            // Re-insert a 0 bit at `position` to find the source index.
            let src = ((i & !lower_mask) << 1) | (i & lower_mask);
            *slot = self.global_state.vector()[src];
        }

        self.global_state = AmplitudeState::new(new_vec);
        self.num_qubits -= 1;
        Ok(())
    }

    pub(crate) fn apply_hadamard(&mut self, position: usize) -> Result<()> {
        self.apply_single_qubit_gate(position, &hadamard_matrix())
    }

    pub(crate) fn apply_flip(&mut self, position: usize) -> Result<()> {
        self.apply_single_qubit_gate(position, &flip_matrix())
    }

    /// Applies a 2x2 matrix to the qubit at `position`.
    fn apply_single_qubit_gate(&mut self, position: usize, matrix: &[[Complex<f64>; 2]; 2]) -> Result<()> {
        self.check_position(position)?;
        let k_mask = 1usize << position;
        let lower_mask = k_mask - 1;
        let upper_mask = !lower_mask;

        let state = self.global_state.vector_mut();
        let dim = state.len();

        // Iterate over pairs of basis states differing only at `position`
        for i in 0..dim / 2 {
            let i0 = ((i & upper_mask) << 1) | (i & lower_mask);
            let i1 = i0 | k_mask;

            let psi_0 = state[i0];
            let psi_1 = state[i1];
            state[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            state[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
        Ok(())
    }

    /// Swaps the target bit on every basis state whose control bits are all 1.
    pub(crate) fn apply_controlled_flip(&mut self, controls: &[usize], target: usize) -> Result<()> {
        self.check_position(target)?;
        let mut control_mask = 0usize;
        for &c in controls {
            self.check_position(c)?;
            if c == target {
                return Err(DjError::invalid("Control and target qubits cannot be the same for a controlled flip"));
            }
            control_mask |= 1 << c;
        }

        let t_mask = 1usize << target;
        let state = self.global_state.vector_mut();
        for k in 0..state.len() {
            if k & t_mask == 0 && k & control_mask == control_mask {
                state.swap(k, k | t_mask);
            }
        }
        Ok(())
    }

    /// Probability that the qubit at `position` reads 1.
    pub(crate) fn probability_of_one(&self, position: usize) -> Result<f64> {
        self.check_position(position)?;
        Ok(self.global_state.probability_of_one(position))
    }

    /// Projects the state onto `outcome` for the qubit at `position` and
    /// renormalises. `probability` is the probability of that outcome.
    pub(crate) fn collapse(&mut self, position: usize, outcome: Outcome, probability: f64) -> Result<()> {
        self.check_position(position)?;
        if probability <= AMPLITUDE_TOLERANCE {
            return Err(DjError::invalid(format!(
                "Cannot collapse position {} onto outcome {} with probability {:.3e}",
                position, outcome, probability
            )));
        }

        let mask = 1usize << position;
        let keep_set = outcome.is_one();
        let scale = 1.0 / probability.sqrt();
        for (k, amp) in self.global_state.vector_mut().iter_mut().enumerate() {
            if (k & mask != 0) == keep_set {
                *amp *= scale;
            } else {
                *amp = Complex::zero();
            }
        }
        Ok(())
    }

    fn check_position(&self, position: usize) -> Result<()> {
        if position >= self.num_qubits {
            return Err(DjError::invalid(format!(
                "Position {} out of bounds for {} live qubit(s)",
                position, self.num_qubits
            )));
        }
        Ok(())
    }
}

/// Hadamard: |0> -> |+>, |1> -> |->. Its own inverse.
fn hadamard_matrix() -> [[Complex<f64>; 2]; 2] {
    [
        [Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(FRAC_1_SQRT_2, 0.0)],
        [Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(-FRAC_1_SQRT_2, 0.0)],
    ]
}

/// Binary swap (Pauli-X).
fn flip_matrix() -> [[Complex<f64>; 2]; 2] {
    [
        [Complex::zero(), Complex::new(1.0, 0.0)],
        [Complex::new(1.0, 0.0), Complex::zero()],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TOLERANCE: f64 = 1e-9;

    fn assert_complex_vec_approx_equal(actual: &[Complex<f64>], expected: &[Complex<f64>], context: &str) {
        assert_eq!(actual.len(), expected.len(), "Vector length mismatch - {}", context);
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            let dist_sq = (a - e).norm_sqr();
            assert!(
                dist_sq < TEST_TOLERANCE * TEST_TOLERANCE,
                "Vector mismatch at index {} - Actual: {}, Expected: {}, Context: {}",
                i, a, e, context
            );
        }
    }

    fn engine_with(n: usize) -> StateVectorEngine {
        let mut engine = StateVectorEngine::new();
        for _ in 0..n {
            engine.push_qubit().unwrap();
        }
        engine
    }

    #[test]
    fn push_qubit_doubles_dimension_and_keeps_ground_state() {
        let engine = engine_with(3);
        assert_eq!(engine.num_qubits(), 3);
        assert_eq!(engine.state().dim(), 8);
        assert_eq!(engine.state().vector()[0], Complex::new(1.0, 0.0));
        assert!(engine.state().vector()[1..].iter().all(|c| c.is_zero()));
    }

    #[test]
    fn reserve_qubits_preallocates_the_full_width() -> Result<()> {
        let mut engine = StateVectorEngine::new();
        engine.reserve_qubits(4)?;
        assert!(engine.global_state.vector_mut().capacity() >= 16);
        for _ in 0..4 {
            engine.push_qubit()?;
        }
        assert_eq!(engine.state().dim(), 16);
        Ok(())
    }

    #[test]
    fn reserve_qubits_refuses_instead_of_aborting() {
        let mut engine = engine_with(2);
        // 2^62 amplitudes exceed any address space; 2^72 overflows usize.
        assert_eq!(
            engine.reserve_qubits(60).unwrap_err(),
            DjError::ResourceExhausted { requested: 60, available: 0 }
        );
        assert!(matches!(engine.reserve_qubits(70), Err(DjError::ResourceExhausted { .. })));
        assert!(matches!(engine.reserve_qubits(usize::MAX), Err(DjError::ResourceExhausted { .. })));
        assert_eq!(engine.num_qubits(), 2);
        assert_eq!(engine.state().dim(), 4);
    }

    #[test]
    fn hadamard_is_involutive() -> Result<()> {
        let mut engine = engine_with(2);
        engine.apply_hadamard(1)?;
        let h = FRAC_1_SQRT_2;
        assert_complex_vec_approx_equal(
            engine.state().vector(),
            &[Complex::new(h, 0.0), Complex::zero(), Complex::new(h, 0.0), Complex::zero()],
            "H on position 1",
        );
        engine.apply_hadamard(1)?;
        assert_complex_vec_approx_equal(
            engine.state().vector(),
            &[Complex::new(1.0, 0.0), Complex::zero(), Complex::zero(), Complex::zero()],
            "H twice",
        );
        Ok(())
    }

    #[test]
    fn controlled_flip_requires_all_controls() -> Result<()> {
        let mut engine = engine_with(3);
        engine.apply_flip(0)?; // |001>
        engine.apply_controlled_flip(&[0, 1], 2)?;
        assert_eq!(engine.state().vector()[0b001], Complex::new(1.0, 0.0));

        engine.apply_flip(1)?; // |011>
        engine.apply_controlled_flip(&[0, 1], 2)?;
        assert_eq!(engine.state().vector()[0b111], Complex::new(1.0, 0.0));
        Ok(())
    }

    #[test]
    fn controlled_flip_rejects_target_as_control() {
        let mut engine = engine_with(2);
        let err = engine.apply_controlled_flip(&[1], 1).unwrap_err();
        assert!(matches!(err, DjError::InvalidOperation { .. }));
    }

    #[test]
    fn minus_ancilla_turns_flip_into_phase() -> Result<()> {
        // position 0: input in |+>, position 1: ancilla in |->
        let mut engine = engine_with(2);
        engine.apply_hadamard(0)?;
        engine.apply_flip(1)?;
        engine.apply_hadamard(1)?;
        engine.apply_controlled_flip(&[0], 1)?;
        // Input picks up a relative minus sign: (|0> - |1>)/√2 ⊗ |->
        engine.apply_hadamard(0)?;
        assert!((engine.probability_of_one(0)? - 1.0).abs() < TEST_TOLERANCE);
        Ok(())
    }

    #[test]
    fn collapse_renormalises() -> Result<()> {
        let mut engine = engine_with(1);
        engine.apply_hadamard(0)?;
        engine.collapse(0, Outcome::One, 0.5)?;
        assert_complex_vec_approx_equal(
            engine.state().vector(),
            &[Complex::zero(), Complex::new(1.0, 0.0)],
            "collapse onto |1>",
        );
        Ok(())
    }

    #[test]
    fn remove_qubit_compacts_positions() -> Result<()> {
        let mut engine = engine_with(3);
        engine.apply_flip(2)?; // |100>
        engine.remove_qubit(1)?;
        assert_eq!(engine.num_qubits(), 2);
        assert_eq!(engine.state().vector()[0b10], Complex::new(1.0, 0.0));
        Ok(())
    }

    #[test]
    fn remove_qubit_refuses_residual_state() {
        let mut engine = engine_with(2);
        engine.apply_hadamard(0).unwrap();
        let err = engine.remove_qubit(0).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn set_state_checks_dimension() {
        let mut engine = engine_with(1);
        let err = engine.set_state(AmplitudeState::new(vec![Complex::zero(); 4])).unwrap_err();
        assert!(matches!(err, DjError::InvalidOperation { .. }));
        assert!(engine.set_state(AmplitudeState::new(vec![Complex::zero(), Complex::new(1.0, 0.0)])).is_ok());
    }
}
