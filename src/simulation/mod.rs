// src/simulation/mod.rs

//! The simulator boundary.
//!
//! [`QuantumBackend`] is the capability set the algorithm, the oracles and
//! the harness consume: allocate qubits, apply the three primitive gates,
//! measure, release. It is object safe and always passed explicitly
//! (`&mut dyn QuantumBackend`), never reached through global state, so a
//! stub backend can be injected in tests.
//!
//! [`Simulator`] is the bundled implementation: a dense state vector whose
//! width grows and shrinks with the number of live qubits, capped by
//! [`SimulatorConfig::max_qubits`].

mod results;
pub(crate) mod engine;

pub use results::MeasurementLog;

use crate::core::{
    AmplitudeState, DjError, Outcome, QubitId, Result, AMPLITUDE_TOLERANCE, DEFAULT_MAX_QUBITS, MAX_SUPPORTED_QUBITS,
};
use crate::operations::Gate;
use engine::StateVectorEngine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

/// Capabilities a simulator engine must provide.
///
/// Every call is synchronous. Ids returned by [`allocate`](Self::allocate)
/// stay valid until passed to [`release`](Self::release); afterwards any use
/// is an [`DjError::InvariantViolation`].
pub trait QuantumBackend {
    /// Allocates `count` fresh qubits in |0>.
    /// Fails with [`DjError::ResourceExhausted`] when the cap would be exceeded.
    fn allocate(&mut self, count: usize) -> Result<Vec<QubitId>>;

    /// Applies one gate.
    fn apply(&mut self, gate: &Gate) -> Result<()>;

    /// Measures one qubit in the computational basis, collapsing the state.
    fn measure(&mut self, qubit: QubitId) -> Result<Outcome>;

    /// Returns qubits to the pool. Each must be in |0>.
    fn release(&mut self, qubits: &[QubitId]) -> Result<()>;

    /// Number of currently allocated qubits.
    fn live_qubits(&self) -> usize;

    /// Maximum number of simultaneously live qubits.
    fn capacity(&self) -> usize;

    /// Uniform-superposition transform on one qubit.
    fn hadamard(&mut self, target: QubitId) -> Result<()> {
        self.apply(&Gate::Superposition { target })
    }

    /// Bit flip on one qubit.
    fn flip(&mut self, target: QubitId) -> Result<()> {
        self.apply(&Gate::Flip { target })
    }

    /// Flips `target` where every control reads 1.
    fn controlled_flip(&mut self, controls: &[QubitId], target: QubitId) -> Result<()> {
        self.apply(&Gate::ControlledFlip { controls: controls.to_vec(), target })
    }
}

/// Settings for a [`Simulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Cap on simultaneously live qubits. The state vector holds
    /// `2^max_qubits` amplitudes at worst. A [`Simulator`] clamps it to
    /// [`MAX_SUPPORTED_QUBITS`].
    pub max_qubits: usize,
    /// Seed for the measurement RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { max_qubits: DEFAULT_MAX_QUBITS, seed: None }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// State-vector implementation of [`QuantumBackend`].
#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    engine: StateVectorEngine,
    /// Maps live qubit ids to their bit position in the engine.
    positions: HashMap<QubitId, usize>,
    /// Inverse of `positions`, indexed by bit position.
    order: Vec<QubitId>,
    /// Ids that were released. Never reused, so a hit here is a stale handle.
    retired: HashSet<QubitId>,
    next_id: u64,
    rng: StdRng,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::with_config(SimulatorConfig::default())
    }
}

impl Simulator {
    /// Creates a new Simulator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut config: SimulatorConfig) -> Self {
        if config.max_qubits > MAX_SUPPORTED_QUBITS {
            warn!(requested = config.max_qubits, clamped = MAX_SUPPORTED_QUBITS, "qubit cap clamped");
            config.max_qubits = MAX_SUPPORTED_QUBITS;
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        debug!(max_qubits = config.max_qubits, seed = ?config.seed, "simulator created");
        Self {
            config,
            engine: StateVectorEngine::new(),
            positions: HashMap::new(),
            order: Vec::new(),
            retired: HashSet::new(),
            next_id: 0,
            rng,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Current amplitude state over all live qubits, lowest position first.
    pub fn state(&self) -> &AmplitudeState {
        self.engine.state()
    }

    /// Live qubit ids in position order (bit 0 of a basis index first).
    pub fn live_ids(&self) -> &[QubitId] {
        &self.order
    }

    /// Probability that `qubit` would read 1, without measuring it.
    pub fn probability_of_one(&self, qubit: QubitId) -> Result<f64> {
        let position = self.position(qubit)?;
        self.engine.probability_of_one(position)
    }

    fn position(&self, qubit: QubitId) -> Result<usize> {
        if let Some(p) = self.positions.get(&qubit) {
            return Ok(*p);
        }
        if self.retired.contains(&qubit) {
            Err(DjError::invariant(format!("use of released qubit {}", qubit)))
        } else {
            Err(DjError::UnknownQubit { qubit })
        }
    }

    fn positions_of(&self, qubits: &[QubitId]) -> Result<Vec<usize>> {
        qubits.iter().map(|q| self.position(*q)).collect()
    }
}

impl QuantumBackend for Simulator {
    fn allocate(&mut self, count: usize) -> Result<Vec<QubitId>> {
        if count == 0 {
            return Err(DjError::invalid("Cannot allocate zero qubits"));
        }
        let available = self.config.max_qubits.saturating_sub(self.order.len());
        if count > available {
            return Err(DjError::ResourceExhausted { requested: count, available });
        }

        // Reserve the whole batch first: either every qubit fits or none is
        // added.
        self.engine.reserve_qubits(count)?;
        let base = self.order.len();
        for pushed in 0..count {
            if let Err(e) = self.engine.push_qubit() {
                for position in (base..base + pushed).rev() {
                    self.engine.remove_qubit(position)?;
                }
                return Err(e);
            }
        }

        let mut ids = Vec::with_capacity(count);
        for offset in 0..count {
            let id = QubitId(self.next_id);
            self.next_id += 1;
            self.positions.insert(id, base + offset);
            self.order.push(id);
            ids.push(id);
        }
        debug_assert_eq!(self.engine.num_qubits(), self.order.len());
        trace!(count, live = self.order.len(), "allocated qubits");
        Ok(ids)
    }

    fn apply(&mut self, gate: &Gate) -> Result<()> {
        match gate {
            Gate::Superposition { target } => {
                let p = self.position(*target)?;
                self.engine.apply_hadamard(p)
            }
            Gate::Flip { target } => {
                let p = self.position(*target)?;
                self.engine.apply_flip(p)
            }
            Gate::ControlledFlip { controls, target } => {
                let t = self.position(*target)?;
                let cs = self.positions_of(controls)?;
                self.engine.apply_controlled_flip(&cs, t)
            }
        }
    }

    fn measure(&mut self, qubit: QubitId) -> Result<Outcome> {
        let position = self.position(qubit)?;
        let p_one = self.engine.probability_of_one(position)?;

        let outcome = if p_one <= AMPLITUDE_TOLERANCE {
            Outcome::Zero
        } else if p_one >= 1.0 - AMPLITUDE_TOLERANCE {
            Outcome::One
        } else if self.rng.random::<f64>() < p_one {
            Outcome::One
        } else {
            Outcome::Zero
        };

        let probability = if outcome.is_one() { p_one } else { 1.0 - p_one };
        self.engine.collapse(position, outcome, probability)?;
        trace!(%qubit, %outcome, p_one, "measured");
        Ok(outcome)
    }

    fn release(&mut self, qubits: &[QubitId]) -> Result<()> {
        // Validate the whole batch before mutating anything.
        let mut seen = HashSet::with_capacity(qubits.len());
        for q in qubits {
            if !seen.insert(*q) {
                return Err(DjError::invariant(format!("qubit {} listed twice in one release", q)));
            }
            if self.retired.contains(q) {
                return Err(DjError::invariant(format!("double release of qubit {}", q)));
            }
            let p_one = self.engine.probability_of_one(self.position(*q)?)?;
            if p_one > AMPLITUDE_TOLERANCE {
                return Err(DjError::invariant(format!(
                    "qubit {} released with P(1) = {:.3e}; reset it first",
                    q, p_one
                )));
            }
        }

        for q in qubits {
            let position = self.position(*q)?;
            self.engine.remove_qubit(position)?;
            self.order.remove(position);
            self.positions.remove(q);
            for (p, id) in self.order.iter().enumerate().skip(position) {
                self.positions.insert(*id, p);
            }
            self.retired.insert(*q);
        }
        trace!(count = qubits.len(), live = self.order.len(), "released qubits");
        Ok(())
    }

    fn live_qubits(&self) -> usize {
        self.order.len()
    }

    fn capacity(&self) -> usize {
        self.config.max_qubits
    }
}
