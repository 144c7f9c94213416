// src/harness/mod.rs

//! Drives the decision algorithm against a list of oracles with known
//! answers and reports which ones it classified correctly.
//!
//! Test cases are declared up front with [`SuiteBuilder`]; parameterised
//! families are expanded into one independent case per parameter at build
//! time, so each failure names exactly one oracle instance. [`Harness`] runs
//! the cases in order on an injected backend. A resource or assertion
//! failure is recorded against its case and the run moves on; only an
//! invariant violation stops the suite.

use crate::algorithm;
use crate::core::{Classification, DjError, DEFAULT_REGISTER_SIZE};
use crate::oracles::{AlwaysOne, AlwaysZero, OddNumberOfOnes, Oracle, QubitIsOne, SharedOracle};
use crate::register::ScopedRegister;
use crate::simulation::QuantumBackend;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// One oracle with its expected classification.
#[derive(Debug, Clone)]
pub struct TestCase {
    label: String,
    oracle: SharedOracle,
    expected: Classification,
    register_size: usize,
}

impl TestCase {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn oracle(&self) -> &dyn Oracle {
        self.oracle.as_ref()
    }

    pub fn expected(&self) -> Classification {
        self.expected
    }

    pub fn register_size(&self) -> usize {
        self.register_size
    }
}

/// Builds a flat list of [`TestCase`]s.
#[derive(Default)]
pub struct SuiteBuilder {
    cases: Vec<TestCase>,
    invalid: Vec<String>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single case.
    pub fn case<O>(mut self, label: impl Into<String>, oracle: O, expected: Classification, register_size: usize) -> Self
    where
        O: Oracle + 'static,
    {
        self.push(label.into(), Arc::new(oracle), expected, register_size);
        self
    }

    /// Adds one case per parameter in `params`; `make` builds the oracle and
    /// `label` names the case for that parameter.
    pub fn family<P, O, I>(
        mut self,
        params: I,
        label: impl Fn(&P) -> String,
        make: impl Fn(P) -> O,
        expected: Classification,
        register_size: usize,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        O: Oracle + 'static,
    {
        for p in params {
            let name = label(&p);
            self.push(name, Arc::new(make(p)), expected, register_size);
        }
        self
    }

    fn push(&mut self, label: String, oracle: SharedOracle, expected: Classification, register_size: usize) {
        if register_size == 0 {
            self.invalid.push(label.clone());
        }
        self.cases.push(TestCase { label, oracle, expected, register_size });
    }

    /// Finalises the list. Fails if any case has a zero-width register.
    pub fn build(self) -> Result<Vec<TestCase>, DjError> {
        if !self.invalid.is_empty() {
            return Err(DjError::invalid(format!(
                "register size must be at least 1 for case(s): {}",
                self.invalid.join(", ")
            )));
        }
        Ok(self.cases)
    }
}

/// The stock suite: constant zero, constant one, odd number of ones, and
/// a per-qubit parity check for every cell, all on `register_size` qubits.
pub fn default_suite(register_size: usize) -> Result<Vec<TestCase>, DjError> {
    SuiteBuilder::new()
        .case("constant zero", AlwaysZero, Classification::Constant, register_size)
        .case("constant one", AlwaysOne, Classification::Constant, register_size)
        .case("odd number of |1> check", OddNumberOfOnes, Classification::Balanced, register_size)
        .family(
            0..register_size,
            |i| format!("q{} parity check", i),
            QubitIsOne::new,
            Classification::Balanced,
            register_size,
        )
        .build()
}

/// [`default_suite`] at the conventional width of ten qubits.
pub fn standard_suite() -> Result<Vec<TestCase>, DjError> {
    default_suite(DEFAULT_REGISTER_SIZE)
}

/// Why a case did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("Test failed: {label} should be {expected} but the algorithm says it was {actual}")]
    AssertionFailed {
        label: String,
        expected: Classification,
        actual: Classification,
    },

    #[error("{label}: {source}")]
    Simulation {
        label: String,
        #[source]
        source: DjError,
    },
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed(HarnessError),
}

/// Per-case report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub label: String,
    pub register_size: usize,
    pub expected: Classification,
    /// `None` when the run aborted before classifying.
    pub observed: Option<Classification>,
    pub status: CaseStatus,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CaseStatus::Passed => write!(f, "PASS  {} ({} qubits): {}", self.label, self.register_size, self.expected),
            CaseStatus::Failed(e) => write!(f, "FAIL  {} ({} qubits): {}", self.label, self.register_size, e),
        }
    }
}

/// Aggregate of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// 0 when every case passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() { 0 } else { 1 }
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in &self.cases {
            writeln!(f, "{}", case)?;
        }
        write!(f, "{} passed, {} failed, {} total", self.passed(), self.failed(), self.cases.len())
    }
}

/// Runs test cases one after another on a borrowed backend.
pub struct Harness<'a> {
    backend: &'a mut dyn QuantumBackend,
}

impl<'a> Harness<'a> {
    pub fn new(backend: &'a mut dyn QuantumBackend) -> Self {
        Self { backend }
    }

    /// Runs one case. The register is reset and released before returning,
    /// whatever the outcome.
    ///
    /// # Returns
    /// * `Ok(CaseReport)` for passes, mismatches and resource exhaustion.
    /// * `Err(DjError::InvariantViolation)` if the lifecycle contract broke;
    ///   the suite must not continue on that backend.
    pub fn run_case(&mut self, case: &TestCase) -> Result<CaseReport, DjError> {
        info!(oracle = %case.label, qubits = case.register_size, "Running test: {}", case.label);

        let observed = self.classify(case);
        let (observed, status) = match observed {
            Ok(actual) if actual == case.expected => (Some(actual), CaseStatus::Passed),
            Ok(actual) => {
                let failure = HarnessError::AssertionFailed {
                    label: case.label.clone(),
                    expected: case.expected,
                    actual,
                };
                warn!("{}", failure);
                (Some(actual), CaseStatus::Failed(failure))
            }
            Err(e) if e.is_fatal() => {
                error!(oracle = %case.label, error = %e, "aborting suite");
                return Err(e);
            }
            Err(e) => {
                warn!(oracle = %case.label, error = %e, "case aborted");
                (None, CaseStatus::Failed(HarnessError::Simulation { label: case.label.clone(), source: e }))
            }
        };

        if matches!(status, CaseStatus::Passed) {
            info!(oracle = %case.label, "Passed!");
        }
        Ok(CaseReport {
            label: case.label.clone(),
            register_size: case.register_size,
            expected: case.expected,
            observed,
            status,
        })
    }

    /// Runs every case in order. Stops early only on an invariant violation.
    pub fn run_suite(&mut self, cases: &[TestCase]) -> Result<SuiteReport, DjError> {
        let mut report = SuiteReport::default();
        for case in cases {
            report.cases.push(self.run_case(case)?);
        }
        info!(passed = report.passed(), failed = report.failed(), "suite finished");
        Ok(report)
    }

    fn classify(&mut self, case: &TestCase) -> Result<Classification, DjError> {
        let mut scoped = ScopedRegister::allocate(&mut *self.backend, case.register_size)?;
        let (backend, register) = scoped.parts();
        let classification = algorithm::check_if_constant_or_balanced(backend, case.oracle(), register);
        // A failed run still returns its qubits. A lifecycle defect found
        // during cleanup outranks the run's own recoverable error.
        scoped.finish(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Simulator, SimulatorConfig};
    use crate::validation::check_no_leaked_qubits;

    fn sim() -> Simulator {
        Simulator::with_config(SimulatorConfig::new().with_seed(99))
    }

    #[test]
    fn default_suite_expands_parity_family() -> Result<(), DjError> {
        let cases = default_suite(10)?;
        assert_eq!(cases.len(), 13);
        assert_eq!(cases[3].label(), "q0 parity check");
        assert_eq!(cases[12].label(), "q9 parity check");
        assert!(cases.iter().all(|c| c.register_size() == 10));
        assert_eq!(cases[12].oracle().name(), "q9 parity check");
        Ok(())
    }

    #[test]
    fn zero_register_size_is_rejected() {
        let err = SuiteBuilder::new()
            .case("empty", AlwaysZero, Classification::Constant, 0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn mismatch_is_reported_with_expected_and_actual() -> Result<(), DjError> {
        let cases = SuiteBuilder::new()
            .case("mislabelled", OddNumberOfOnes, Classification::Constant, 3)
            .case("constant zero", AlwaysZero, Classification::Constant, 3)
            .build()?;
        let mut sim = sim();
        let report = Harness::new(&mut sim).run_suite(&cases)?;

        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.exit_code(), 1);
        let first = &report.cases()[0];
        assert_eq!(first.observed, Some(Classification::Balanced));
        assert_eq!(
            first.status,
            CaseStatus::Failed(HarnessError::AssertionFailed {
                label: "mislabelled".to_string(),
                expected: Classification::Constant,
                actual: Classification::Balanced,
            })
        );
        assert_eq!(
            first.to_string(),
            "FAIL  mislabelled (3 qubits): Test failed: mislabelled should be constant but the algorithm says it was balanced"
        );
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn resource_exhaustion_does_not_stop_the_suite() -> Result<(), DjError> {
        let cases = SuiteBuilder::new()
            .case("too wide", AlwaysZero, Classification::Constant, 8)
            .case("fits", AlwaysOne, Classification::Constant, 3)
            .build()?;
        let mut sim = Simulator::with_config(SimulatorConfig::new().with_seed(2).with_max_qubits(4));
        let report = Harness::new(&mut sim).run_suite(&cases)?;

        assert!(matches!(
            report.cases()[0].status,
            CaseStatus::Failed(HarnessError::Simulation { source: DjError::ResourceExhausted { .. }, .. })
        ));
        assert!(report.cases()[1].passed());
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn suite_display_ends_with_summary() -> Result<(), DjError> {
        let cases = default_suite(2)?;
        let mut sim = sim();
        let report = Harness::new(&mut sim).run_suite(&cases)?;
        let text = report.to_string();
        assert!(text.starts_with("PASS  constant zero (2 qubits): constant"));
        assert!(text.ends_with("5 passed, 0 failed, 5 total"));
        assert_eq!(report.exit_code(), 0);
        Ok(())
    }
}
