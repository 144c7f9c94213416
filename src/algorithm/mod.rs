// src/algorithm/mod.rs

//! The Deutsch-Jozsa decision procedure.
//!
//! Given a bit-flip oracle promised to be either constant or balanced, one
//! oracle query decides which:
//!
//! 1. put every input cell into uniform superposition (`H` on each);
//! 2. run the oracle in phase-flip mode, so every input `x` with `f(x) = 1`
//!    picks up a minus sign;
//! 3. apply `H` to every cell again;
//! 4. measure. A constant function leaves all phases equal, which
//!    interferes back to exactly |0...0>. A balanced function flips half of
//!    them, which leaves zero amplitude on |0...0>, so at least one cell
//!    reads 1.

use crate::core::{Classification, DjError, QubitId, Result};
use crate::oracles::Oracle;
use crate::register::{Register, ScopedRegister};
use crate::simulation::{MeasurementLog, QuantumBackend};
use std::fmt;
use tracing::{debug, trace};

/// Progress of one decision run. Transitions are strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    Superposed,
    PhaseMarked,
    Unsuperposed,
    Measured,
    Classified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Superposed => "superposed",
            Stage::PhaseMarked => "phase-marked",
            Stage::Unsuperposed => "unsuperposed",
            Stage::Measured => "measured",
            Stage::Classified => "classified",
        };
        write!(f, "{}", name)
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRun {
    pub classification: Classification,
    pub measurements: MeasurementLog,
}

/// Runs `oracle` so that it flips the *phase* of the input branches it
/// would have flipped the target on.
///
/// Allocates one ancilla, prepares it in |-> (flip, then superpose), calls
/// the oracle with the ancilla as target, then resets and releases the
/// ancilla. Because `X|-> = -|->`, a flip on the ancilla shows up as a sign
/// on the input branch and leaves the ancilla itself unentangled. The order
/// flip → superpose → oracle is required.
pub fn run_flip_marker_as_phase_marker(
    backend: &mut dyn QuantumBackend,
    oracle: &dyn Oracle,
    register: &Register,
) -> Result<()> {
    register.ensure_live()?;
    let mut ancilla = ScopedRegister::allocate(backend, 1)?;
    let (backend, ancilla_register) = ancilla.parts();
    let target = ancilla_register.get(0)?;

    let marked = mark_phase(backend, oracle, register, target);

    // The ancilla is still |->; measuring it to reset does not disturb the input.
    ancilla.finish(marked)
}

fn mark_phase(backend: &mut dyn QuantumBackend, oracle: &dyn Oracle, register: &Register, target: QubitId) -> Result<()> {
    backend.flip(target)?;
    backend.hadamard(target)?;
    oracle.apply(backend, register, target)
}

/// Runs the full decision procedure on `register` and returns the
/// classification together with the measured bits.
///
/// `register` must be live and in |0...0>. On return every cell has been
/// measured, so it is in a classical state and can be reset cheaply.
pub fn run(backend: &mut dyn QuantumBackend, oracle: &dyn Oracle, register: &Register) -> Result<DecisionRun> {
    register.ensure_live()?;
    let oracle_name = oracle.name();
    let mut stage = Stage::Init;
    trace!(%stage, oracle = %oracle_name, size = register.len());

    for q in register.qubits() {
        backend.hadamard(*q)?;
    }
    stage = advance(stage, Stage::Superposed);

    run_flip_marker_as_phase_marker(backend, oracle, register)?;
    stage = advance(stage, Stage::PhaseMarked);

    for q in register.qubits() {
        backend.hadamard(*q)?;
    }
    stage = advance(stage, Stage::Unsuperposed);

    // Every cell is measured, not just up to the first 1, so none is left in
    // superposition.
    let mut measurements = MeasurementLog::new();
    for q in register.qubits() {
        let outcome = backend.measure(*q)?;
        if !measurements.record(*q, outcome) {
            return Err(DjError::invariant(format!("{} measured twice in one run", q)));
        }
    }
    stage = advance(stage, Stage::Measured);

    let classification = Classification::from_constant(measurements.first_one().is_none());
    stage = advance(stage, Stage::Classified);
    debug!(%stage, oracle = %oracle_name, %classification, bits = %measurements.bit_string(), "decision complete");

    Ok(DecisionRun { classification, measurements })
}

/// Returns whether `oracle` is constant or balanced, using one query.
pub fn check_if_constant_or_balanced(
    backend: &mut dyn QuantumBackend,
    oracle: &dyn Oracle,
    register: &Register,
) -> Result<Classification> {
    run(backend, oracle, register).map(|r| r.classification)
}

/// Allocates a register of `size`, classifies `oracle`, and cleans up.
pub fn classify(backend: &mut dyn QuantumBackend, oracle: &dyn Oracle, size: usize) -> Result<Classification> {
    let mut scoped = ScopedRegister::allocate(backend, size)?;
    let (backend, register) = scoped.parts();
    let classification = check_if_constant_or_balanced(backend, oracle, register);
    scoped.finish(classification)
}

fn advance(from: Stage, to: Stage) -> Stage {
    debug_assert!(to > from, "stage must move forward: {} -> {}", from, to);
    trace!(%from, %to, "stage transition");
    to
}
