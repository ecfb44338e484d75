//! Single-operation gate.
//!
//! Only one long-running command may be in flight at a time. The gate
//! hands out at most one permit; dropping the permit releases it, so
//! every exit path (success, error, panic unwind) restores the idle
//! state.

use std::sync::atomic::{AtomicBool, Ordering};

pub struct WorkerGate {
    busy: AtomicBool,
}

impl WorkerGate {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Claims the gate. Returns `None` when an operation already holds
    /// it.
    pub fn begin(&self) -> Option<WorkerPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| WorkerPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Default for WorkerGate {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WorkerPermit<'a> {
    gate: &'a WorkerGate,
}

impl Drop for WorkerPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_while_permit_held() {
        let gate = WorkerGate::new();
        let permit = gate.begin().unwrap();
        assert!(gate.is_busy());
        assert!(gate.begin().is_none());
        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.begin().is_some());
    }

    #[test]
    fn permit_released_on_unwind() {
        let gate = WorkerGate::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = gate.begin().unwrap();
            panic!("worker failed");
        }));
        assert!(result.is_err());
        assert!(!gate.is_busy());
    }
}
