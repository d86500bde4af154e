//! Violation records, hook outcomes, and run snapshots.
//!
//! `Violation` is what the governor hands to the host's termination sink.
//! `HookOutcome` is what each hook returns to its caller. `GovernorSnapshot`
//! is the read-only summary a host can render after the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    format::{format_hms, format_megabytes},
    run::RunId,
};

/// Which ceiling was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    Time,
    Heap,
    Depth,
    Instructions,
    States,
    NewStates,
}

impl BudgetKind {
    /// All kinds, in the order the governor documents them.
    pub const ALL: [BudgetKind; 6] = [
        BudgetKind::Time,
        BudgetKind::Heap,
        BudgetKind::Depth,
        BudgetKind::Instructions,
        BudgetKind::States,
        BudgetKind::NewStates,
    ];

    /// The configuration key this kind is read from.
    pub fn config_key(self) -> &'static str {
        match self {
            BudgetKind::Time => "budget.max_time",
            BudgetKind::Heap => "budget.max_heap",
            BudgetKind::Depth => "budget.max_depth",
            BudgetKind::Instructions => "budget.max_insn",
            BudgetKind::States => "budget.max_state",
            BudgetKind::NewStates => "budget.max_new_states",
        }
    }

    /// Format the violation message for an observed value and its ceiling.
    ///
    /// Time values are milliseconds, heap values bytes.
    pub fn describe(self, observed: u64, limit: u64) -> String {
        match self {
            BudgetKind::Time => format!(
                "max time exceeded: {} ({}ms) > {} ({}ms)",
                format_hms(observed),
                observed,
                format_hms(limit),
                limit
            ),
            BudgetKind::Heap => format!(
                "max heap exceeded: {} > {}",
                format_megabytes(observed),
                format_megabytes(limit)
            ),
            BudgetKind::Depth => format!("max search depth exceeded: {observed} > {limit}"),
            BudgetKind::Instructions => {
                format!("max instruction count exceeded: {observed} > {limit}")
            }
            BudgetKind::States => format!("max states exceeded: {observed} > {limit}"),
            BudgetKind::NewStates => {
                format!("max new state count exceeded: {observed} > {limit}")
            }
        }
    }
}

impl std::fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BudgetKind::Time => "time",
            BudgetKind::Heap => "heap",
            BudgetKind::Depth => "depth",
            BudgetKind::Instructions => "instructions",
            BudgetKind::States => "states",
            BudgetKind::NewStates => "new_states",
        };
        f.write_str(name)
    }
}

/// One crossed ceiling: which budget, what was observed, and the limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The budget that tripped.
    pub kind: BudgetKind,
    /// The observed value (milliseconds for time, bytes for heap).
    pub observed: u64,
    /// The configured ceiling, in the same unit as `observed`.
    pub limit: u64,
    /// Human-readable explanation surfaced in the run's report.
    pub message: String,
    /// Wall-clock time the violation was detected (UTC).
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    /// Build a violation and format its message.
    pub fn new(kind: BudgetKind, observed: u64, limit: u64) -> Self {
        Self {
            kind,
            observed,
            limit,
            message: kind.describe(observed, limit),
            detected_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// The result of one hook invocation.
///
/// Hosts may pattern-match on this, or ignore it and rely on the
/// `TerminationSink` callbacks, which carry the same information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// No ceiling crossed; the search may proceed.
    Continue,
    /// This invocation tripped the governor. The sink has been notified and
    /// termination requested.
    Violated(Violation),
    /// The governor tripped earlier in the run; nothing was evaluated or
    /// reported.
    AlreadyTripped,
}

impl HookOutcome {
    /// True for any outcome after which the search must stop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HookOutcome::Continue)
    }

    /// The violation produced by this call, if it was the tripping call.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            HookOutcome::Violated(v) => Some(v),
            _ => None,
        }
    }
}

/// A point-in-time summary of a governor, suitable for reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorSnapshot {
    pub run_id: RunId,
    /// Milliseconds since the governor was attached.
    pub elapsed_millis: u64,
    pub instruction_count: u64,
    pub new_state_count: u64,
    /// Heap growth since attachment; absent when the heap check is off.
    pub heap_growth_bytes: Option<u64>,
    pub check_interval: u64,
    /// The violation that tripped the governor, if any.
    pub violation: Option<Violation>,
}

impl GovernorSnapshot {
    /// True if the run ended on a budget violation.
    pub fn tripped(&self) -> bool {
        self.violation.is_some()
    }
}
