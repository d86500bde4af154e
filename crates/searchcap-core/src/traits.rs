//! Capability traits the governor consumes from its host.
//!
//! These four traits are the complete interface between a search host and
//! the governor:
//!
//! - `Clock`          : wall-clock time source
//! - `HeapProbe`      : heap usage source
//! - `SearchProbe`    : read-only view of the host search at a state boundary
//! - `TerminationSink`: where violations and stop requests are delivered
//!
//! `Clock`, `HeapProbe` and `TerminationSink` are injected once at
//! construction. `SearchProbe` is passed to each state-advance hook, because
//! it is usually the host search itself and is borrowed only for the call.

use searchcap_contracts::error::BudgetResult;

/// A wall-clock time source.
///
/// Must be a fast, non-blocking query; the governor may call it on every
/// state transition.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary but fixed epoch.
    fn current_time_millis(&self) -> u64;
}

/// A heap usage source.
///
/// The governor only ever compares two readings from the same probe, so the
/// absolute meaning of the number (GC heap, resident set, allocator stats) is
/// up to the implementation.
pub trait HeapProbe: Send + Sync {
    /// Bytes currently in use.
    ///
    /// An `Err` disables the heap check for the rest of the run; it never
    /// aborts the governor.
    fn heap_used_bytes(&self) -> BudgetResult<u64>;
}

/// What the host search exposes at a state boundary.
pub trait SearchProbe {
    /// Depth of the state just entered.
    fn current_search_depth(&self) -> u64;

    /// Cumulative identifier of the state just entered.
    fn current_state_id(&self) -> u64;

    /// True if the state just entered has not been visited before in this run.
    fn is_new_state(&self) -> bool;

    /// True while the host is re-executing a previously recorded trace.
    fn is_trace_replay(&self) -> bool;
}

/// Where the governor delivers its termination decision.
///
/// Implementations must tolerate being called from whichever thread invoked
/// the hook. The governor calls each method at most once per run.
pub trait TerminationSink: Send + Sync {
    /// Record the violation so it can appear in the run's final report.
    fn notify_constraint_violated(&self, message: &str);

    /// Ask the host to stop the search.
    fn request_terminate(&self);

    /// Ask the host to abandon the transition currently executing.
    ///
    /// Only used for violations detected mid-transition by the instruction
    /// hook.
    fn interrupt_current_transition(&self, reason: &str);
}
