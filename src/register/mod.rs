// src/register/mod.rs

//! Fixed-size qubit registers and their lifecycle.
//!
//! A [`Register`] is an ordered list of qubit ids obtained from a backend.
//! Its lifecycle is allocate → use → reset → release, and the last two steps
//! must happen on every exit path. [`ScopedRegister`] ties that to scope:
//! dropping the guard resets and releases the register, so an early `?`
//! return or a failed assertion cannot leak qubits into the next run.

use crate::core::{DjError, Outcome, QubitId, Result};
use crate::simulation::QuantumBackend;
use std::fmt;
use tracing::{error, trace, warn};

/// Ordered set of qubits owned by one run.
#[derive(Debug, PartialEq, Eq)]
pub struct Register {
    qubits: Vec<QubitId>,
    released: bool,
}

impl Register {
    /// Allocates `size` qubits, all in |0>.
    pub fn allocate(backend: &mut dyn QuantumBackend, size: usize) -> Result<Self> {
        let qubits = backend.allocate(size)?;
        trace!(size, "register allocated");
        Ok(Self { qubits, released: false })
    }

    /// The register's qubits in cell order.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Qubit at `index`, or `InvalidOperation` when out of range.
    pub fn get(&self, index: usize) -> Result<QubitId> {
        self.qubits.get(index).copied().ok_or_else(|| {
            DjError::invalid(format!("qubit index {} out of range for a register of {}", index, self.qubits.len()))
        })
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Errors with `InvariantViolation` if the register was already released.
    pub fn ensure_live(&self) -> Result<()> {
        if self.released {
            return Err(DjError::invariant("use of a released register"));
        }
        Ok(())
    }

    /// Forces every cell to |0>: measure it and flip it back if it read 1.
    pub fn reset_all(&self, backend: &mut dyn QuantumBackend) -> Result<()> {
        self.ensure_live()?;
        for q in &self.qubits {
            if backend.measure(*q)? == Outcome::One {
                backend.flip(*q)?;
            }
        }
        Ok(())
    }

    /// Returns the qubits to the backend. Every cell must already be |0>.
    pub fn release(&mut self, backend: &mut dyn QuantumBackend) -> Result<()> {
        if self.released {
            return Err(DjError::invariant("double release of a register"));
        }
        backend.release(&self.qubits)?;
        self.released = true;
        trace!(size = self.qubits.len(), "register released");
        Ok(())
    }
}

impl Register {
    /// Best-effort teardown after a failed reset or release: resets and
    /// returns each cell the backend still accepts, one at a time, then marks
    /// the register released. Returns how many cells went back.
    pub(crate) fn salvage(&mut self, backend: &mut dyn QuantumBackend) -> usize {
        let mut returned = 0;
        for q in &self.qubits {
            let reset = match backend.measure(*q) {
                Ok(Outcome::One) => backend.flip(*q),
                Ok(Outcome::Zero) => Ok(()),
                Err(e) => Err(e),
            };
            match reset.and_then(|()| backend.release(&[*q])) {
                Ok(()) => returned += 1,
                Err(e) => warn!(qubit = %q, error = %e, "cell could not be returned"),
            }
        }
        self.released = true;
        returned
    }

    #[cfg(test)]
    pub(crate) fn from_ids(qubits: Vec<QubitId>) -> Self {
        Self { qubits, released: false }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Register[")?;
        for (i, q) in self.qubits.iter().enumerate() {
            write!(f, "{}{}", if i > 0 { ", " } else { "" }, q)?;
        }
        write!(f, "]{}", if self.released { " (released)" } else { "" })
    }
}

/// A register that is reset and released when it goes out of scope.
///
/// The guard holds the backend exclusively for its lifetime; use
/// [`parts`](Self::parts) to work on both at once. [`close`](Self::close)
/// performs the cleanup eagerly and reports its errors. If cleanup only
/// happens in `Drop`, errors are logged, and an invariant violation panics
/// unless the thread is already unwinding.
pub struct ScopedRegister<'a> {
    backend: &'a mut dyn QuantumBackend,
    register: Register,
    closed: bool,
}

impl<'a> ScopedRegister<'a> {
    pub fn allocate(backend: &'a mut dyn QuantumBackend, size: usize) -> Result<Self> {
        let register = Register::allocate(backend, size)?;
        Ok(Self { backend, register, closed: false })
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    /// Split borrow of the backend and the register.
    pub fn parts(&mut self) -> (&mut (dyn QuantumBackend + 'a), &Register) {
        (&mut *self.backend, &self.register)
    }

    /// Resets and releases now, returning any cleanup error.
    pub fn close(mut self) -> Result<()> {
        self.cleanup()
    }

    /// Closes the guard and folds its cleanup result into `outcome`, the
    /// result of the work done on the register.
    ///
    /// With two errors, a fatal one is returned ahead of a recoverable one;
    /// otherwise the error from `outcome` comes first. The other is logged.
    pub fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        match (outcome, self.close()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
            (Err(run), Err(cleanup)) => {
                let (kept, dropped) =
                    if cleanup.is_fatal() && !run.is_fatal() { (cleanup, run) } else { (run, cleanup) };
                error!(error = %dropped, "second error while closing register");
                Err(kept)
            }
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self
            .register
            .reset_all(&mut *self.backend)
            .and_then(|()| self.register.release(&mut *self.backend));
        if let Err(e) = &result {
            if !self.register.is_released() {
                let returned = self.register.salvage(&mut *self.backend);
                warn!(error = %e, returned, size = self.register.len(), "salvaged register after failed cleanup");
            }
        }
        result
    }
}

impl Drop for ScopedRegister<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            error!(error = %e, register = %self.register, "register cleanup failed");
            if e.is_fatal() && !std::thread::panicking() {
                panic!("register cleanup violated an invariant: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Simulator, SimulatorConfig};
    use crate::validation::check_no_leaked_qubits;

    fn sim() -> Simulator {
        Simulator::with_config(SimulatorConfig::new().with_seed(11).with_max_qubits(8))
    }

    #[test]
    fn reset_all_returns_cells_to_zero() -> Result<()> {
        let mut sim = sim();
        let mut reg = Register::allocate(&mut sim, 3)?;
        sim.flip(reg.qubits()[0])?;
        sim.hadamard(reg.qubits()[2])?;
        reg.reset_all(&mut sim)?;
        for q in reg.qubits() {
            assert_eq!(sim.probability_of_one(*q)?, 0.0);
        }
        reg.release(&mut sim)?;
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn release_twice_is_invariant_violation() -> Result<()> {
        let mut sim = sim();
        let mut reg = Register::allocate(&mut sim, 2)?;
        reg.release(&mut sim)?;
        assert!(reg.release(&mut sim).unwrap_err().is_fatal());
        assert!(reg.reset_all(&mut sim).unwrap_err().is_fatal());
        Ok(())
    }

    #[test]
    fn get_out_of_range_is_invalid() -> Result<()> {
        let mut sim = sim();
        let mut reg = Register::allocate(&mut sim, 2)?;
        assert_eq!(reg.get(1)?, reg.qubits()[1]);
        assert!(matches!(reg.get(2), Err(DjError::InvalidOperation { .. })));
        reg.release(&mut sim)
    }

    #[test]
    fn scoped_register_cleans_up_on_drop() -> Result<()> {
        let mut sim = sim();
        {
            let mut scoped = ScopedRegister::allocate(&mut sim, 4)?;
            let (backend, reg) = scoped.parts();
            for q in reg.qubits() {
                backend.hadamard(*q)?;
            }
        }
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn scoped_register_cleans_up_on_early_return() -> Result<()> {
        fn failing(backend: &mut dyn QuantumBackend) -> Result<()> {
            let mut scoped = ScopedRegister::allocate(backend, 2)?;
            let (backend, reg) = scoped.parts();
            backend.flip(reg.qubits()[1])?;
            backend.flip(QubitId(10_000))?; // unknown qubit, bails out
            scoped.close()
        }

        let mut sim = sim();
        assert!(matches!(failing(&mut sim), Err(DjError::UnknownQubit { .. })));
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn close_reports_cleanup_errors() -> Result<()> {
        let mut sim = sim();
        let mut scoped = ScopedRegister::allocate(&mut sim, 1)?;
        let (backend, reg) = scoped.parts();
        // Releasing behind the guard's back makes its own release a double release.
        let q = reg.qubits()[0];
        backend.release(&[q])?;
        let err = scoped.close().unwrap_err();
        assert!(err.is_fatal());
        Ok(())
    }

    #[test]
    fn failed_cleanup_still_returns_the_other_cells() -> Result<()> {
        let mut sim = sim();
        let mut scoped = ScopedRegister::allocate(&mut sim, 3)?;
        let (backend, reg) = scoped.parts();
        for q in reg.qubits() {
            backend.hadamard(*q)?;
        }
        let first = reg.qubits()[0];
        if backend.measure(first)? == Outcome::One {
            backend.flip(first)?;
        }
        backend.release(&[first])?;

        assert!(scoped.close().unwrap_err().is_fatal());
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn finish_prefers_a_fatal_cleanup_error() -> Result<()> {
        let mut sim = sim();
        let mut scoped = ScopedRegister::allocate(&mut sim, 2)?;
        let (backend, reg) = scoped.parts();
        backend.release(&[reg.qubits()[1]])?;

        let outcome: Result<()> = Err(DjError::invalid("run failed"));
        let err = scoped.finish(outcome).unwrap_err();
        assert!(matches!(err, DjError::InvariantViolation { .. }));
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn finish_keeps_the_run_error_when_cleanup_succeeds() -> Result<()> {
        let mut sim = sim();
        let scoped = ScopedRegister::allocate(&mut sim, 2)?;
        let err = scoped.finish::<()>(Err(DjError::invalid("run failed"))).unwrap_err();
        assert_eq!(err, DjError::invalid("run failed"));
        check_no_leaked_qubits(&sim)
    }

    #[test]
    fn display_lists_cells() -> Result<()> {
        let mut sim = sim();
        let mut reg = Register::allocate(&mut sim, 2)?;
        assert_eq!(reg.to_string(), "Register[q(0), q(1)]");
        reg.release(&mut sim)?;
        assert_eq!(reg.to_string(), "Register[q(0), q(1)] (released)");
        Ok(())
    }
}
