// src/simulation/results.rs
use crate::core::{Outcome, QubitId};
use std::fmt;

/// Ordered record of measurements taken during one algorithm run.
///
/// Entries keep the order in which the qubits were measured, which for a
/// register is its cell order. A qubit appears at most once: measurement is
/// one-shot per cell within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementLog {
    outcomes: Vec<(QubitId, Outcome)>,
}

impl MeasurementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. Returns `false` without recording if the qubit
    /// was already measured in this log.
    pub(crate) fn record(&mut self, qubit: QubitId, outcome: Outcome) -> bool {
        if self.get(&qubit).is_some() {
            return false;
        }
        self.outcomes.push((qubit, outcome));
        true
    }

    /// Outcome recorded for `qubit`, if any.
    pub fn get(&self, qubit: &QubitId) -> Option<Outcome> {
        self.outcomes.iter().find(|(id, _)| id == qubit).map(|(_, o)| *o)
    }

    /// All recorded outcomes in measurement order.
    pub fn outcomes(&self) -> &[(QubitId, Outcome)] {
        &self.outcomes
    }

    /// First qubit that read 1, scanning in measurement order.
    pub fn first_one(&self) -> Option<QubitId> {
        self.outcomes.iter().find(|(_, o)| o.is_one()).map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes rendered as a bit string, first measured qubit leftmost.
    pub fn bit_string(&self) -> String {
        self.outcomes.iter().map(|(_, o)| if o.is_one() { '1' } else { '0' }).collect()
    }
}

impl fmt::Display for MeasurementLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outcomes.is_empty() {
            return write!(f, "Measurements: none");
        }
        write!(f, "Measurements: {}", self.bit_string())
    }
}
