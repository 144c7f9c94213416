// src/oracles/mod.rs

//! Bit-flip oracles.
//!
//! An oracle represents an unknown function `f: {0,1}^n -> {0,1}`. It acts
//! on an input register and one target qubit and flips the target on exactly
//! those basis states of the input where `f` is 1:
//! `|x>|y> -> |x>|y xor f(x)>`.
//!
//! # Contract
//!
//! Applying an oracle twice must be the identity. Nothing checks this at run
//! time; an oracle that breaks it makes the Deutsch-Jozsa classification
//! silently wrong rather than failing. Oracles built only from `Flip` and
//! `ControlledFlip` gates that undo their own basis changes satisfy it by
//! construction. New oracles should get a property test that applies them
//! twice to random basis states, like the ones in `tests/oracle_properties.rs`.
//!
//! Oracles may capture parameters (a qubit index, a bit string) but hold no
//! mutable state.

use crate::core::{DjError, Outcome, QubitId, Result};
use crate::register::{Register, ScopedRegister};
use crate::simulation::QuantumBackend;
use std::fmt;
use std::sync::Arc;

/// A self-inverse bit-flip transform on `(input register, target qubit)`.
pub trait Oracle: Send + Sync {
    /// Human-readable name used in logs and reports.
    fn name(&self) -> String;

    /// Flips `target` wherever the function is 1 on `input`.
    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()>;
}

impl fmt::Debug for dyn Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oracle({})", self.name())
    }
}

/// Wraps a plain function or closure as an [`Oracle`].
pub struct FnOracle<F> {
    name: String,
    body: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&mut dyn QuantumBackend, &Register, QubitId) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self { name: name.into(), body }
    }
}

impl<F> Oracle for FnOracle<F>
where
    F: Fn(&mut dyn QuantumBackend, &Register, QubitId) -> Result<()> + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        (self.body)(backend, input, target)
    }
}

/// Never flips the target. Constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysZero;

impl Oracle for AlwaysZero {
    fn name(&self) -> String {
        "constant zero".to_string()
    }

    fn apply(&self, _backend: &mut dyn QuantumBackend, input: &Register, _target: QubitId) -> Result<()> {
        input.ensure_live()
    }
}

/// Always flips the target. Constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOne;

impl Oracle for AlwaysOne {
    fn name(&self) -> String {
        "constant one".to_string()
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        input.ensure_live()?;
        backend.flip(target)
    }
}

/// Flips the target when the input holds an odd number of ones. Balanced.
///
/// XOR across the register: one CNOT per input qubit onto the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct OddNumberOfOnes;

impl Oracle for OddNumberOfOnes {
    fn name(&self) -> String {
        "odd number of |1> check".to_string()
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        input.ensure_live()?;
        for q in input.qubits() {
            backend.controlled_flip(&[*q], target)?;
        }
        Ok(())
    }
}

/// Flips the target when the input qubit at `index` is 1. Balanced.
#[derive(Debug, Clone, Copy)]
pub struct QubitIsOne {
    pub index: usize,
}

impl QubitIsOne {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Oracle for QubitIsOne {
    fn name(&self) -> String {
        format!("q{} parity check", self.index)
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        input.ensure_live()?;
        let control = input.get(self.index)?;
        backend.controlled_flip(&[control], target)
    }
}

/// Flips the target only on |1...1>. Neither constant nor balanced for
/// registers wider than one qubit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllOnes;

impl Oracle for AllOnes {
    fn name(&self) -> String {
        "all ones check".to_string()
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        input.ensure_live()?;
        backend.controlled_flip(input.qubits(), target)
    }
}

/// Flips the target only on |0...0>.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllZeros;

impl Oracle for AllZeros {
    fn name(&self) -> String {
        "all zeros check".to_string()
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        MatchesBitString::new(vec![false; input.len()]).apply(backend, input, target)
    }
}

/// Flips the target only when the input equals `bits` (cell 0 first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchesBitString {
    bits: Vec<bool>,
}

impl MatchesBitString {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    fn flip_zero_cells(&self, backend: &mut dyn QuantumBackend, input: &Register) -> Result<()> {
        for (q, bit) in input.qubits().iter().zip(&self.bits) {
            if !bit {
                backend.flip(*q)?;
            }
        }
        Ok(())
    }
}

impl Oracle for MatchesBitString {
    fn name(&self) -> String {
        let pattern: String = self.bits.iter().map(|b| if *b { '1' } else { '0' }).collect();
        format!("matches |{}> check", pattern)
    }

    fn apply(&self, backend: &mut dyn QuantumBackend, input: &Register, target: QubitId) -> Result<()> {
        input.ensure_live()?;
        if self.bits.len() != input.len() {
            return Err(DjError::invalid(format!(
                "bit string of length {} does not match a register of {}",
                self.bits.len(),
                input.len()
            )));
        }
        // Map the wanted pattern onto |1...1>, test, then undo the mapping.
        self.flip_zero_cells(backend, input)?;
        backend.controlled_flip(input.qubits(), target)?;
        self.flip_zero_cells(backend, input)
    }
}

/// Shared handle to any oracle, as stored in test cases.
pub type SharedOracle = Arc<dyn Oracle>;

/// Evaluates `oracle` classically on one input: prepares `|input>|0>` on
/// fresh qubits, applies the oracle and reads the target.
///
/// Bit `i` of `input` sets cell `i`. This is the one-query-per-input path the
/// Deutsch-Jozsa algorithm avoids; it is useful for checking what an oracle
/// computes.
pub fn classical_query(
    backend: &mut dyn QuantumBackend,
    oracle: &dyn Oracle,
    width: usize,
    input: u64,
) -> Result<bool> {
    if width == 0 || width > 64 {
        return Err(DjError::invalid(format!("classical query width {} must be in 1..=64", width)));
    }
    let mut scoped = ScopedRegister::allocate(backend, width)?;
    let (backend, register) = scoped.parts();
    for (i, q) in register.qubits().iter().enumerate() {
        if input >> i & 1 == 1 {
            backend.flip(*q)?;
        }
    }

    let mut target = ScopedRegister::allocate(backend, 1)?;
    let (backend, target_register) = target.parts();
    let t = target_register.get(0)?;
    oracle.apply(backend, register, t)?;
    let value = backend.measure(t)? == Outcome::One;
    target.close()?;
    scoped.close()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Simulator, SimulatorConfig};

    fn sim() -> Simulator {
        Simulator::with_config(SimulatorConfig::new().with_seed(3).with_max_qubits(12))
    }

    fn truth_table(oracle: &dyn Oracle, width: usize) -> Result<Vec<bool>> {
        let mut sim = sim();
        (0..1u64 << width).map(|x| classical_query(&mut sim, oracle, width, x)).collect()
    }

    #[test]
    fn constant_oracles_have_flat_truth_tables() -> Result<()> {
        assert!(truth_table(&AlwaysZero, 3)?.iter().all(|v| !v));
        assert!(truth_table(&AlwaysOne, 3)?.iter().all(|v| *v));
        Ok(())
    }

    #[test]
    fn odd_parity_matches_popcount() -> Result<()> {
        let table = truth_table(&OddNumberOfOnes, 4)?;
        for (x, v) in table.iter().enumerate() {
            assert_eq!(*v, x.count_ones() % 2 == 1, "input {:04b}", x);
        }
        Ok(())
    }

    #[test]
    fn qubit_is_one_reads_single_bit() -> Result<()> {
        let table = truth_table(&QubitIsOne::new(2), 3)?;
        for (x, v) in table.iter().enumerate() {
            assert_eq!(*v, x >> 2 & 1 == 1);
        }
        Ok(())
    }

    #[test]
    fn qubit_is_one_rejects_out_of_range_index() {
        let err = truth_table(&QubitIsOne::new(5), 3).unwrap_err();
        assert!(matches!(err, DjError::InvalidOperation { .. }));
    }

    #[test]
    fn pattern_oracles_fire_once() -> Result<()> {
        assert_eq!(truth_table(&AllOnes, 3)?.iter().filter(|v| **v).count(), 1);
        assert!(truth_table(&AllOnes, 3)?[0b111]);
        assert!(truth_table(&AllZeros, 3)?[0]);
        let pattern = MatchesBitString::new(vec![true, false, true]);
        let table = truth_table(&pattern, 3)?;
        assert_eq!(table.iter().filter(|v| **v).count(), 1);
        assert!(table[0b101]);
        assert_eq!(pattern.name(), "matches |101> check");
        Ok(())
    }

    #[test]
    fn bit_string_length_is_checked() {
        let err = truth_table(&MatchesBitString::new(vec![true]), 2).unwrap_err();
        assert!(matches!(err, DjError::InvalidOperation { .. }));
    }

    #[test]
    fn fn_oracle_delegates() -> Result<()> {
        let last_bit = FnOracle::new("last bit", |backend: &mut dyn QuantumBackend, input: &Register, target| {
            let last = input.get(input.len() - 1)?;
            backend.controlled_flip(&[last], target)
        });
        assert_eq!(last_bit.name(), "last bit");
        assert_eq!(truth_table(&last_bit, 2)?, vec![false, false, true, true]);
        Ok(())
    }
}
