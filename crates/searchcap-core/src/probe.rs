//! System-backed measurement sources.
//!
//! `SystemClock` reads UTC wall-clock time. `ProcessHeapProbe` reads the
//! resident memory of the current process via `sysinfo`; Rust has no
//! collector heap to ask, so process memory growth stands in for it.
//! `UnavailableHeapProbe` always fails and is used when no process probe can
//! be built, which leaves the heap check disabled.

use std::sync::Mutex;

use chrono::Utc;
use sysinfo::{Pid, System};

use searchcap_contracts::error::{BudgetError, BudgetResult};

use crate::traits::{Clock, HeapProbe};

const HEAP_SOURCE: &str = "process heap";

/// Wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_time_millis(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Resident memory of the current process, refreshed on every query.
pub struct ProcessHeapProbe {
    pid: Pid,
    system: Mutex<System>,
}

impl ProcessHeapProbe {
    /// Build a probe for the calling process.
    ///
    /// Returns `BudgetError::MeasurementUnavailable` if the platform cannot
    /// report the current process id.
    pub fn current() -> BudgetResult<Self> {
        let pid = sysinfo::get_current_pid().map_err(|e| unavailable(e.to_string()))?;
        Ok(Self {
            pid,
            system: Mutex::new(System::new()),
        })
    }
}

impl HeapProbe for ProcessHeapProbe {
    fn heap_used_bytes(&self) -> BudgetResult<u64> {
        let mut system = self
            .system
            .lock()
            .map_err(|e| unavailable(format!("probe lock poisoned: {e}")))?;

        if !system.refresh_process(self.pid) {
            return Err(unavailable(format!("process {} not found", self.pid)));
        }

        system
            .process(self.pid)
            .map(|p| p.memory())
            .ok_or_else(|| unavailable(format!("process {} not found", self.pid)))
    }
}

/// A heap probe that never produces a reading.
#[derive(Debug, Clone, Default)]
pub struct UnavailableHeapProbe {
    reason: String,
}

impl UnavailableHeapProbe {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl HeapProbe for UnavailableHeapProbe {
    fn heap_used_bytes(&self) -> BudgetResult<u64> {
        Err(unavailable(self.reason.clone()))
    }
}

fn unavailable(reason: String) -> BudgetError {
    BudgetError::MeasurementUnavailable {
        source_name: HEAP_SOURCE.to_string(),
        reason,
    }
}
