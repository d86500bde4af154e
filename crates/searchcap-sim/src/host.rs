//! Host-side termination signals.
//!
//! `HostSignals` is the simulated host's `TerminationSink`. The governor
//! writes to it; the search loop polls it between instructions and after
//! every transition.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tracing::info;

use searchcap_core::traits::TerminationSink;

#[derive(Default)]
struct SignalState {
    terminate: AtomicBool,
    interrupt: AtomicBool,
    violations: Mutex<Vec<String>>,
    interrupt_reasons: Mutex<Vec<String>>,
}

/// Shared flags and messages between the governor and the search loop.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone, Default)]
pub struct HostSignals {
    inner: Arc<SignalState>,
}

impl HostSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the governor has asked the search to stop.
    pub fn terminate_requested(&self) -> bool {
        self.inner.terminate.load(Ordering::Acquire)
    }

    /// Consume a pending transition interrupt, if any.
    pub fn take_interrupt(&self) -> bool {
        self.inner.interrupt.swap(false, Ordering::AcqRel)
    }

    /// Every violation message delivered so far, in order.
    pub fn violations(&self) -> Vec<String> {
        self.inner
            .violations
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Every interrupt reason delivered so far, in order.
    pub fn interrupt_reasons(&self) -> Vec<String> {
        self.inner
            .interrupt_reasons
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl TerminationSink for HostSignals {
    fn notify_constraint_violated(&self, message: &str) {
        info!(message = %message, "search constraint hit");
        if let Ok(mut violations) = self.inner.violations.lock() {
            violations.push(message.to_string());
        }
    }

    fn request_terminate(&self) {
        self.inner.terminate.store(true, Ordering::Release);
    }

    fn interrupt_current_transition(&self, reason: &str) {
        if let Ok(mut reasons) = self.inner.interrupt_reasons.lock() {
            reasons.push(reason.to_string());
        }
        self.inner.interrupt.store(true, Ordering::Release);
    }
}
