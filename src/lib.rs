// src/lib.rs

//! `dj_oracle` - Deutsch-Jozsa classification of bit-flip oracles
//!
//! Decides with a single oracle query whether a boolean function, given as
//! a self-inverse bit-flip oracle, is *constant* or *balanced*. The crate
//! contains the decision algorithm, the phase-kickback step it relies on, a
//! small oracle library, and a harness that runs the algorithm against
//! oracles with known answers. Qubits come from any [`QuantumBackend`]; a
//! state-vector [`Simulator`] is bundled.

pub mod core;
pub mod operations;
pub mod simulation;
pub mod register;
pub mod oracles;
pub mod algorithm;
pub mod harness;
pub mod validation;
pub mod telemetry;

// Re-export the most common types for easier top-level use
pub use crate::core::{Classification, DjError, Outcome, QubitId};
pub use crate::operations::Gate;
pub use crate::simulation::{MeasurementLog, QuantumBackend, Simulator, SimulatorConfig};
pub use crate::register::{Register, ScopedRegister};
pub use crate::oracles::{FnOracle, Oracle};
pub use crate::algorithm::{check_if_constant_or_balanced, classify, run_flip_marker_as_phase_marker};
pub use crate::harness::{default_suite, Harness, HarnessError, SuiteBuilder, SuiteReport, TestCase};
pub use crate::validation::{check_no_leaked_qubits, check_normalization, check_zero_state};

// Example 1: Classify a constant and a balanced oracle
/// ```
/// use dj_oracle::{classify, Classification, DjError, Simulator, SimulatorConfig};
/// use dj_oracle::oracles::{AlwaysOne, OddNumberOfOnes};
///
/// let mut sim = Simulator::with_config(SimulatorConfig::new().with_seed(1));
///
/// // One query decides, however wide the register.
/// assert_eq!(classify(&mut sim, &AlwaysOne, 8)?, Classification::Constant);
/// assert_eq!(classify(&mut sim, &OddNumberOfOnes, 8)?, Classification::Balanced);
/// # Ok::<(), DjError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Run the stock suite through the harness
/// ```
/// use dj_oracle::{default_suite, DjError, Harness, Simulator, SimulatorConfig};
///
/// let cases = default_suite(4)?;
/// let mut sim = Simulator::with_config(SimulatorConfig::new().with_seed(2));
/// let report = Harness::new(&mut sim).run_suite(&cases)?;
///
/// println!("{}", report);
/// assert!(report.all_passed());
/// assert_eq!(report.cases().len(), 7);
/// # Ok::<(), DjError>(())
/// ```
#[doc(hidden)]
const _: () = ();
