//! A deterministic depth-first search host.
//!
//! `SimulatedSearch` walks a uniform tree of `branching` children per state
//! down to `max_depth`, executing a fixed number of instructions per
//! transition. It drives the governor exactly the way a model checker would:
//! one instruction hook per executed instruction, one state hook per
//! completed transition, and it honours interrupt and terminate requests.
//!
//! Optional behaviours:
//!
//! - `replay_prefix`: before exploring, replay a recorded trace of that many
//!   states. Replayed states are new to the state-id numbering but flagged as
//!   trace replay.
//! - `revisit_every`: every n-th transition leads back to the initial state
//!   instead of a fresh one; the search backtracks without expanding it.
//! - `transition_delay`: sleep after each transition's instructions.
//! - `bytes_per_transition`: allocate and keep this much memory per
//!   transition, to grow the process heap.

use std::time::Duration;

use tracing::debug;

use searchcap_contracts::violation::GovernorSnapshot;
use searchcap_core::{traits::SearchProbe, BudgetGovernor};

use crate::host::HostSignals;

/// The shape of the simulated state space and the work done per transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchShape {
    pub branching: u64,
    pub max_depth: u64,
    pub instructions_per_transition: u64,
    pub replay_prefix: u64,
    pub revisit_every: Option<u64>,
    pub transition_delay: Option<Duration>,
    pub bytes_per_transition: usize,
}

impl Default for SearchShape {
    fn default() -> Self {
        Self {
            branching: 2,
            max_depth: 4,
            instructions_per_transition: 100,
            replay_prefix: 0,
            revisit_every: None,
            transition_delay: None,
            bytes_per_transition: 0,
        }
    }
}

impl SearchShape {
    /// Number of transitions a full, ungoverned exploration performs,
    /// excluding replay.
    pub fn full_tree_transitions(&self) -> u64 {
        (1..=self.max_depth)
            .map(|d| self.branching.saturating_pow(u32::try_from(d).unwrap_or(u32::MAX)))
            .fold(0u64, u64::saturating_add)
    }
}

/// What happened during one simulated run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Completed transitions, replay included.
    pub transitions: u64,
    /// Transitions abandoned part-way by an interrupt.
    pub interrupted_transitions: u64,
    /// Highest state id handed out.
    pub last_state_id: u64,
    pub deepest: u64,
    /// True if the whole tree was explored without termination.
    pub completed: bool,
    /// Violation messages the host received.
    pub violations: Vec<String>,
    pub snapshot: GovernorSnapshot,
}

/// A search host over a synthetic tree.
pub struct SimulatedSearch {
    shape: SearchShape,
    signals: HostSignals,
    depth: u64,
    current_state_id: u64,
    next_state_id: u64,
    new_state: bool,
    replaying: bool,
    transitions: u64,
    interrupted: u64,
    deepest: u64,
    ballast: Vec<Vec<u8>>,
}

impl SimulatedSearch {
    /// A search positioned at the initial state (id 0, depth 0).
    pub fn new(shape: SearchShape, signals: HostSignals) -> Self {
        Self {
            shape,
            signals,
            depth: 0,
            current_state_id: 0,
            next_state_id: 1,
            new_state: true,
            replaying: false,
            transitions: 0,
            interrupted: 0,
            deepest: 0,
            ballast: Vec::new(),
        }
    }

    pub fn shape(&self) -> &SearchShape {
        &self.shape
    }

    /// Replay the trace prefix, then explore the tree, until done or told to
    /// stop.
    pub fn run(&mut self, governor: &BudgetGovernor) -> SearchReport {
        debug!(
            run_id = %governor.run_id(),
            branching = self.shape.branching,
            max_depth = self.shape.max_depth,
            replay_prefix = self.shape.replay_prefix,
            "simulated search starting"
        );

        let completed = self.replay_trace(governor) && self.explore(governor, 0);

        debug!(
            run_id = %governor.run_id(),
            transitions = self.transitions,
            completed,
            "simulated search finished"
        );

        SearchReport {
            transitions: self.transitions,
            interrupted_transitions: self.interrupted,
            last_state_id: self.next_state_id - 1,
            deepest: self.deepest,
            completed,
            violations: self.signals.violations(),
            snapshot: governor.snapshot(),
        }
    }

    /// Walk the recorded trace from the root, then backtrack to it.
    fn replay_trace(&mut self, governor: &BudgetGovernor) -> bool {
        for depth in 1..=self.shape.replay_prefix {
            if !self.transition(governor, depth, true) {
                return false;
            }
        }
        self.backtrack_to(0);
        true
    }

    fn explore(&mut self, governor: &BudgetGovernor, depth: u64) -> bool {
        if depth >= self.shape.max_depth {
            return true;
        }
        for _ in 0..self.shape.branching {
            if !self.transition(governor, depth + 1, false) {
                return false;
            }
            if self.new_state && !self.explore(governor, depth + 1) {
                return false;
            }
            self.backtrack_to(depth);
        }
        true
    }

    /// Execute one transition into `depth`. Returns false if the search must
    /// stop.
    fn transition(&mut self, governor: &BudgetGovernor, depth: u64, replay: bool) -> bool {
        for _ in 0..self.shape.instructions_per_transition {
            governor.on_instruction_executed();
            if self.signals.take_interrupt() {
                self.interrupted += 1;
                return false;
            }
        }

        if let Some(delay) = self.shape.transition_delay {
            std::thread::sleep(delay);
        }
        if self.shape.bytes_per_transition > 0 {
            self.ballast.push(vec![0xA5; self.shape.bytes_per_transition]);
        }

        self.transitions += 1;
        let revisit = !replay
            && self
                .shape
                .revisit_every
                .is_some_and(|n| n > 0 && self.transitions % n == 0);

        self.depth = depth;
        self.deepest = self.deepest.max(depth);
        self.replaying = replay;
        if revisit {
            self.new_state = false;
            self.current_state_id = 0;
        } else {
            self.new_state = true;
            self.current_state_id = self.next_state_id;
            self.next_state_id += 1;
        }

        governor.on_state_advanced(self);
        !self.signals.terminate_requested()
    }

    fn backtrack_to(&mut self, depth: u64) {
        self.depth = depth;
        self.replaying = false;
    }
}

impl SearchProbe for SimulatedSearch {
    fn current_search_depth(&self) -> u64 {
        self.depth
    }

    fn current_state_id(&self) -> u64 {
        self.current_state_id
    }

    fn is_new_state(&self) -> bool {
        self.new_state
    }

    fn is_trace_replay(&self) -> bool {
        self.replaying
    }
}
