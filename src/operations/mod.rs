// src/operations/mod.rs

//! Primitive transforms a backend applies to its amplitude state.
//!
//! The set is deliberately small: the Deutsch-Jozsa algorithm, the
//! phase-kickback step and every built-in oracle are written in terms of
//! these three gates only.

use crate::core::QubitId;
use std::fmt;

/// A single gate application.
///
/// All three variants are involutions (applying one twice is the identity),
/// which is what lets oracles built from them satisfy the self-inverse
/// contract by construction when they undo their own basis changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Uniform-superposition transform (Hadamard) on one qubit.
    Superposition {
        target: QubitId,
    },

    /// Bit flip (Pauli-X) on one qubit.
    Flip {
        target: QubitId,
    },

    /// Flip `target` on exactly those basis states where every control reads
    /// 1. With an empty control list this degenerates to `Flip`.
    ControlledFlip {
        controls: Vec<QubitId>,
        target: QubitId,
    },
}

impl Gate {
    /// Returns every qubit the gate touches, controls first.
    pub fn involved_qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::Superposition { target } => vec![*target],
            Gate::Flip { target } => vec![*target],
            Gate::ControlledFlip { controls, target } => {
                let mut ids = controls.clone();
                ids.push(*target);
                ids
            }
        }
    }

    /// Short mnemonic used in logs.
    pub fn symbol(&self) -> &'static str {
        match self {
            Gate::Superposition { .. } => "H",
            Gate::Flip { .. } => "X",
            Gate::ControlledFlip { controls, .. } if controls.len() == 1 => "CX",
            Gate::ControlledFlip { .. } => "MCX",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Superposition { target } | Gate::Flip { target } => {
                write!(f, "{} {}", self.symbol(), target)
            }
            Gate::ControlledFlip { controls, target } => {
                write!(f, "{} [", self.symbol())?;
                for (i, c) in controls.iter().enumerate() {
                    write!(f, "{}{}", if i > 0 { ", " } else { "" }, c)?;
                }
                write!(f, "] -> {}", target)
            }
        }
    }
}
