//! The budget governor: six ceilings, two hooks, one termination decision.
//!
//! The governor is purely reactive. The host calls
//!
//!   on_state_advanced      once per completed state transition
//!   on_instruction_executed once per executed instruction
//!
//! and the governor answers with a `HookOutcome`. The first ceiling crossed
//! trips the governor: the sink is notified, termination is requested, and
//! every later hook call returns `AlreadyTripped` without evaluating or
//! reporting anything.
//!
//! Counters are atomics and the tripped state is a `OnceLock`, so a host
//! running a parallel search may share one governor across threads; the
//! first violation wins and the sink sees exactly one report.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    OnceLock,
};

use tracing::{debug, warn};

use searchcap_contracts::{
    budget::BudgetConfig,
    run::RunId,
    violation::{BudgetKind, GovernorSnapshot, HookOutcome, Violation},
};

use crate::{
    probe::{ProcessHeapProbe, SystemClock, UnavailableHeapProbe},
    traits::{Clock, HeapProbe, SearchProbe, TerminationSink},
};

/// Reason passed to `TerminationSink::interrupt_current_transition`.
pub const BREAK_TRANSITION_REASON: &str = "budgetConstraint";

/// Enforces one `BudgetConfig` over one search run.
///
/// Construct one governor per run. It holds no resources that need explicit
/// release and is discarded when the run ends.
pub struct BudgetGovernor {
    run_id: RunId,
    config: BudgetConfig,
    clock: Box<dyn Clock>,
    heap: Box<dyn HeapProbe>,
    sink: Box<dyn TerminationSink>,
    start_time: u64,
    /// Heap reading at attachment; `None` when `max_heap` is unset or the
    /// first reading failed.
    baseline_heap: Option<u64>,
    heap_disabled: AtomicBool,
    instruction_count: AtomicU64,
    new_state_count: AtomicU64,
    tripped: OnceLock<Violation>,
}

impl BudgetGovernor {
    /// Attach a governor with the given measurement sources and sink.
    ///
    /// The start time is captured unconditionally. The heap baseline is
    /// captured only if `max_heap` is set; if that first reading fails the
    /// heap check is disabled for the run and all other checks stay active.
    pub fn new(
        config: BudgetConfig,
        clock: Box<dyn Clock>,
        heap: Box<dyn HeapProbe>,
        sink: Box<dyn TerminationSink>,
    ) -> Self {
        let run_id = RunId::new();
        let start_time = clock.current_time_millis();

        let baseline_heap = if config.max_heap.is_set() {
            match heap.heap_used_bytes() {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(
                        run_id = %run_id,
                        error = %e,
                        "heap baseline unavailable, heap budget disabled for this run"
                    );
                    None
                }
            }
        } else {
            None
        };

        debug!(
            run_id = %run_id,
            max_time = ?config.max_time.get(),
            max_heap = ?config.max_heap.get(),
            max_depth = ?config.max_depth.get(),
            max_instructions = ?config.max_instructions.get(),
            max_states = ?config.max_states.get(),
            max_new_states = ?config.max_new_states.get(),
            check_interval = config.check_interval.get(),
            "budget governor armed"
        );

        Self {
            run_id,
            config,
            clock,
            heap,
            sink,
            start_time,
            heap_disabled: AtomicBool::new(baseline_heap.is_none()),
            baseline_heap,
            instruction_count: AtomicU64::new(0),
            new_state_count: AtomicU64::new(0),
            tripped: OnceLock::new(),
        }
    }

    /// Attach a governor backed by `SystemClock` and the current process's
    /// memory.
    ///
    /// If the process probe cannot be built the heap check is disabled, the
    /// same as a failing baseline reading.
    pub fn with_system_probes(config: BudgetConfig, sink: Box<dyn TerminationSink>) -> Self {
        let heap: Box<dyn HeapProbe> = match ProcessHeapProbe::current() {
            Ok(probe) => Box::new(probe),
            Err(e) => Box::new(UnavailableHeapProbe::new(e.to_string())),
        };
        Self::new(config, Box::new(SystemClock), heap, sink)
    }

    // ── Hooks ────────────────────────────────────────────────────────────────

    /// Called once per completed state transition, before the host explores
    /// further.
    ///
    /// 1. Time and heap, unthrottled; a trip stops evaluation here.
    /// 2. If the state is new: count it unless the host is replaying a
    ///    trace, then check states, depth, new states in that order.
    pub fn on_state_advanced(&self, search: &dyn SearchProbe) -> HookOutcome {
        if self.is_tripped() {
            return HookOutcome::AlreadyTripped;
        }

        if let Some(v) = self.time_exceeded().or_else(|| self.heap_exceeded()) {
            return self.trip(v, false);
        }

        if search.is_new_state() {
            if !search.is_trace_replay() {
                self.new_state_count.fetch_add(1, Ordering::Relaxed);
            }

            let violation = self
                .states_exceeded(search.current_state_id())
                .or_else(|| self.depth_exceeded(search.current_search_depth()))
                .or_else(|| self.new_states_exceeded());

            if let Some(v) = violation {
                return self.trip(v, false);
            }
        }

        HookOutcome::Continue
    }

    /// Called once per executed instruction.
    ///
    /// The counter always advances. Time, heap and instruction checks run
    /// only when the count is a multiple of `check_interval`, so a violation
    /// may be seen up to `check_interval - 1` instructions late. A trip here
    /// also interrupts the host's current transition.
    #[inline]
    pub fn on_instruction_executed(&self) -> HookOutcome {
        let count = self.instruction_count.fetch_add(1, Ordering::Relaxed) + 1;

        if self.is_tripped() {
            return HookOutcome::AlreadyTripped;
        }
        if count % self.config.check_interval.get() != 0 {
            return HookOutcome::Continue;
        }

        let violation = self
            .time_exceeded()
            .or_else(|| self.heap_exceeded())
            .or_else(|| self.instructions_exceeded());

        match violation {
            Some(v) => self.trip(v, true),
            None => HookOutcome::Continue,
        }
    }

    // ── Predicates ───────────────────────────────────────────────────────────

    /// Wall-clock time since attachment against `max_time`.
    pub fn time_exceeded(&self) -> Option<Violation> {
        let limit = self.config.max_time.get()?;
        let elapsed = self.elapsed_millis();
        (elapsed > limit).then(|| Violation::new(BudgetKind::Time, elapsed, limit))
    }

    /// Heap growth since attachment against `max_heap`.
    ///
    /// A failed reading disables the heap check for the rest of the run.
    pub fn heap_exceeded(&self) -> Option<Violation> {
        let limit = self.config.max_heap.get()?;
        if self.heap_disabled.load(Ordering::Relaxed) {
            return None;
        }
        let growth = self.heap_growth()?;
        (growth > limit).then(|| Violation::new(BudgetKind::Heap, growth, limit))
    }

    /// Host-reported depth against `max_depth`.
    pub fn depth_exceeded(&self, depth: u64) -> Option<Violation> {
        self.config
            .max_depth
            .exceeded_by(depth)
            .map(|limit| Violation::new(BudgetKind::Depth, depth, limit))
    }

    /// Executed instructions against `max_instructions`.
    pub fn instructions_exceeded(&self) -> Option<Violation> {
        let count = self.instruction_count();
        self.config
            .max_instructions
            .exceeded_by(count)
            .map(|limit| Violation::new(BudgetKind::Instructions, count, limit))
    }

    /// Host-reported state id against `max_states`.
    pub fn states_exceeded(&self, state_id: u64) -> Option<Violation> {
        self.config
            .max_states
            .exceeded_by(state_id)
            .map(|limit| Violation::new(BudgetKind::States, state_id, limit))
    }

    /// Non-replay new states against `max_new_states`.
    pub fn new_states_exceeded(&self) -> Option<Violation> {
        let count = self.new_state_count();
        self.config
            .max_new_states
            .exceeded_by(count)
            .map(|limit| Violation::new(BudgetKind::NewStates, count, limit))
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count.load(Ordering::Relaxed)
    }

    pub fn new_state_count(&self) -> u64 {
        self.new_state_count.load(Ordering::Relaxed)
    }

    /// Milliseconds since attachment. A clock reading before the start time
    /// counts as zero.
    pub fn elapsed_millis(&self) -> u64 {
        self.clock.current_time_millis().saturating_sub(self.start_time)
    }

    /// True once any ceiling has been crossed.
    pub fn is_tripped(&self) -> bool {
        self.tripped.get().is_some()
    }

    /// The violation that tripped the governor, if any.
    pub fn violation(&self) -> Option<&Violation> {
        self.tripped.get()
    }

    /// True while the heap check can still fire.
    pub fn heap_check_active(&self) -> bool {
        self.config.max_heap.is_set() && !self.heap_disabled.load(Ordering::Relaxed)
    }

    /// A serializable summary of the run so far.
    pub fn snapshot(&self) -> GovernorSnapshot {
        let heap_growth_bytes = if self.heap_check_active() {
            self.heap_growth()
        } else {
            None
        };

        GovernorSnapshot {
            run_id: self.run_id,
            elapsed_millis: self.elapsed_millis(),
            instruction_count: self.instruction_count(),
            new_state_count: self.new_state_count(),
            heap_growth_bytes,
            check_interval: self.config.check_interval.get(),
            violation: self.violation().cloned(),
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Current heap reading minus the baseline, or `None` after disabling the
    /// heap check on a failed reading.
    fn heap_growth(&self) -> Option<u64> {
        let baseline = self.baseline_heap?;
        match self.heap.heap_used_bytes() {
            Ok(used) => Some(used.saturating_sub(baseline)),
            Err(e) => {
                if !self.heap_disabled.swap(true, Ordering::Relaxed) {
                    warn!(
                        run_id = %self.run_id,
                        error = %e,
                        "heap probe failed, heap budget disabled for this run"
                    );
                }
                None
            }
        }
    }

    /// Move from armed to tripped and run the termination protocol.
    ///
    /// Only the first caller wins; any later or concurrent trip returns
    /// `AlreadyTripped` without touching the sink.
    fn trip(&self, violation: Violation, interrupt_transition: bool) -> HookOutcome {
        if self.tripped.set(violation.clone()).is_err() {
            return HookOutcome::AlreadyTripped;
        }

        warn!(
            run_id = %self.run_id,
            budget = %violation.kind,
            observed = violation.observed,
            limit = violation.limit,
            instructions = self.instruction_count(),
            new_states = self.new_state_count(),
            "budget exceeded, terminating search"
        );

        self.sink.notify_constraint_violated(&violation.message);
        if interrupt_transition {
            self.sink.interrupt_current_transition(BREAK_TRANSITION_REASON);
        }
        self.sink.request_terminate();

        HookOutcome::Violated(violation)
    }
}

impl std::fmt::Debug for BudgetGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetGovernor")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("instruction_count", &self.instruction_count())
            .field("new_state_count", &self.new_state_count())
            .field("tripped", &self.violation())
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    };

    use searchcap_contracts::{
        budget::BudgetConfig,
        error::{BudgetError, BudgetResult},
        format::MEGABYTE,
        violation::{BudgetKind, HookOutcome},
    };

    use crate::traits::{Clock, HeapProbe, SearchProbe, TerminationSink};

    use super::{BudgetGovernor, BREAK_TRANSITION_REASON};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A clock the test advances by hand.
    #[derive(Clone, Default)]
    struct ManualClock {
        now: Arc<AtomicU64>,
    }

    impl ManualClock {
        fn advance(&self, millis: u64) {
            self.now.fetch_add(millis, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn current_time_millis(&self) -> u64 {
            self.now.load(Ordering::Relaxed)
        }
    }

    /// A heap probe whose reading and failure mode the test controls.
    #[derive(Clone, Default)]
    struct MockHeap {
        used: Arc<AtomicU64>,
        failing: Arc<AtomicBool>,
        reads: Arc<AtomicU64>,
    }

    impl HeapProbe for MockHeap {
        fn heap_used_bytes(&self) -> BudgetResult<u64> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            if self.failing.load(Ordering::Relaxed) {
                return Err(BudgetError::MeasurementUnavailable {
                    source_name: "mock heap".to_string(),
                    reason: "simulated failure".to_string(),
                });
            }
            Ok(self.used.load(Ordering::Relaxed))
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SinkEvent {
        Violated(String),
        Interrupted(String),
        Terminate,
    }

    /// A sink that records every call for later inspection.
    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<SinkEvent>>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<SinkEvent> {
            self.events.lock().unwrap().clone()
        }

        fn terminate_count(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| **e == SinkEvent::Terminate)
                .count()
        }
    }

    impl TerminationSink for RecordingSink {
        fn notify_constraint_violated(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(SinkEvent::Violated(message.to_string()));
        }

        fn request_terminate(&self) {
            self.events.lock().unwrap().push(SinkEvent::Terminate);
        }

        fn interrupt_current_transition(&self, reason: &str) {
            self.events
                .lock()
                .unwrap()
                .push(SinkEvent::Interrupted(reason.to_string()));
        }
    }

    /// A fixed view of the host search.
    #[derive(Default)]
    struct MockSearch {
        depth: u64,
        state_id: u64,
        new_state: bool,
        replay: bool,
    }

    impl MockSearch {
        fn fresh(depth: u64, state_id: u64) -> Self {
            Self { depth, state_id, new_state: true, replay: false }
        }
    }

    impl SearchProbe for MockSearch {
        fn current_search_depth(&self) -> u64 {
            self.depth
        }

        fn current_state_id(&self) -> u64 {
            self.state_id
        }

        fn is_new_state(&self) -> bool {
            self.new_state
        }

        fn is_trace_replay(&self) -> bool {
            self.replay
        }
    }

    struct Harness {
        governor: BudgetGovernor,
        clock: ManualClock,
        heap: MockHeap,
        sink: RecordingSink,
    }

    fn harness(config: BudgetConfig) -> Harness {
        let clock = ManualClock::default();
        clock.advance(1_000_000);
        let heap = MockHeap::default();
        heap.used.store(50 * MEGABYTE, Ordering::Relaxed);
        let sink = RecordingSink::default();
        let governor = BudgetGovernor::new(
            config,
            Box::new(clock.clone()),
            Box::new(heap.clone()),
            Box::new(sink.clone()),
        );
        Harness { governor, clock, heap, sink }
    }

    fn run_instructions(governor: &BudgetGovernor, n: u64) -> Vec<(u64, HookOutcome)> {
        (1..=n)
            .map(|i| (i, governor.on_instruction_executed()))
            .filter(|(_, outcome)| *outcome != HookOutcome::Continue)
            .collect()
    }

    // ── Unset ceilings ───────────────────────────────────────────────────────

    /// With nothing configured, no predicate trips for any observed value.
    #[test]
    fn test_unset_ceilings_never_trip() {
        let h = harness(BudgetConfig::unlimited());
        h.clock.advance(u64::MAX / 4);
        h.heap.used.store(u64::MAX, Ordering::Relaxed);

        for value in [0, 1, 10_000, u64::MAX] {
            assert!(h.governor.depth_exceeded(value).is_none());
            assert!(h.governor.states_exceeded(value).is_none());
        }
        assert!(h.governor.time_exceeded().is_none());
        assert!(h.governor.heap_exceeded().is_none());
        assert!(h.governor.instructions_exceeded().is_none());
        assert!(h.governor.new_states_exceeded().is_none());

        for id in 0..1_000 {
            let outcome = h.governor.on_state_advanced(&MockSearch::fresh(id, id));
            assert_eq!(outcome, HookOutcome::Continue);
        }
        assert!(run_instructions(&h.governor, 30_000).is_empty());
        assert!(h.sink.events().is_empty());
    }

    /// The heap baseline is only measured when a heap ceiling is configured.
    #[test]
    fn test_heap_baseline_skipped_when_unset() {
        let h = harness(BudgetConfig::unlimited());
        assert_eq!(h.heap.reads.load(Ordering::Relaxed), 0);
        assert!(!h.governor.heap_check_active());

        let h = harness(BudgetConfig::unlimited().with_max_heap(MEGABYTE));
        assert_eq!(h.heap.reads.load(Ordering::Relaxed), 1);
        assert!(h.governor.heap_check_active());
    }

    // ── Strict boundaries ────────────────────────────────────────────────────

    #[test]
    fn test_time_boundary_is_strict() {
        let h = harness(BudgetConfig::unlimited().with_max_time(std::time::Duration::from_millis(500)));
        h.clock.advance(500);
        assert!(h.governor.time_exceeded().is_none());
        h.clock.advance(1);
        let v = h.governor.time_exceeded().expect("501ms > 500ms");
        assert_eq!(v.kind, BudgetKind::Time);
        assert_eq!((v.observed, v.limit), (501, 500));
        assert!(v.message.contains("00:00:00"));
    }

    #[test]
    fn test_heap_boundary_is_measured_from_baseline() {
        let h = harness(BudgetConfig::unlimited().with_max_heap(10 * MEGABYTE));

        // Baseline is 50MB; growth of exactly 10MB is allowed.
        h.heap.used.store(60 * MEGABYTE, Ordering::Relaxed);
        assert!(h.governor.heap_exceeded().is_none());

        h.heap.used.store(60 * MEGABYTE + 1, Ordering::Relaxed);
        let v = h.governor.heap_exceeded().expect("growth above 10MB");
        assert_eq!(v.kind, BudgetKind::Heap);
        assert_eq!(v.message, "max heap exceeded: 10MB > 10MB");
    }

    #[test]
    fn test_heap_shrinking_below_baseline_is_not_a_violation() {
        let h = harness(BudgetConfig::unlimited().with_max_heap(1));
        h.heap.used.store(0, Ordering::Relaxed);
        assert!(h.governor.heap_exceeded().is_none());
    }

    #[test]
    fn test_depth_states_and_instruction_boundaries_are_strict() {
        let h = harness(
            BudgetConfig::unlimited()
                .with_max_depth(5)
                .with_max_states(7)
                .with_max_instructions(3),
        );

        assert!(h.governor.depth_exceeded(5).is_none());
        assert_eq!(h.governor.depth_exceeded(6).unwrap().limit, 5);

        assert!(h.governor.states_exceeded(7).is_none());
        assert_eq!(h.governor.states_exceeded(8).unwrap().kind, BudgetKind::States);

        for _ in 0..3 {
            h.governor.on_instruction_executed();
        }
        assert!(h.governor.instructions_exceeded().is_none());
        h.governor.on_instruction_executed();
        assert_eq!(h.governor.instructions_exceeded().unwrap().observed, 4);
    }

    #[test]
    fn test_new_states_boundary_is_strict() {
        let h = harness(BudgetConfig::unlimited().with_max_new_states(2));
        assert_eq!(h.governor.on_state_advanced(&MockSearch::fresh(1, 1)), HookOutcome::Continue);
        assert_eq!(h.governor.on_state_advanced(&MockSearch::fresh(2, 2)), HookOutcome::Continue);
        let outcome = h.governor.on_state_advanced(&MockSearch::fresh(3, 3));
        let v = outcome.violation().expect("third new state exceeds 2");
        assert_eq!(v.kind, BudgetKind::NewStates);
        assert_eq!((v.observed, v.limit), (3, 2));
    }

    // ── State-advance hook ───────────────────────────────────────────────────

    /// max_state=3: the fourth transition (state id 4) trips.
    #[test]
    fn test_state_ceiling_trips_on_fourth_transition() {
        let h = harness(BudgetConfig::unlimited().with_max_states(3));

        for id in 1..=3 {
            assert_eq!(h.governor.on_state_advanced(&MockSearch::fresh(id, id)), HookOutcome::Continue);
        }
        let outcome = h.governor.on_state_advanced(&MockSearch::fresh(4, 4));
        let v = outcome.violation().expect("state id 4 exceeds 3");
        assert!(v.message.contains("states exceeded"));
        assert!(v.message.contains('3'));

        assert_eq!(
            h.sink.events(),
            vec![SinkEvent::Violated(v.message.clone()), SinkEvent::Terminate],
            "state-level trips never interrupt the transition"
        );
    }

    /// max_depth=1: reaching depth 2 trips at the state boundary.
    #[test]
    fn test_depth_ceiling_trips_at_depth_two() {
        let h = harness(BudgetConfig::unlimited().with_max_depth(1));
        assert_eq!(h.governor.on_state_advanced(&MockSearch::fresh(1, 1)), HookOutcome::Continue);

        let outcome = h.governor.on_state_advanced(&MockSearch::fresh(2, 2));
        let v = outcome.violation().expect("depth 2 exceeds 1");
        assert_eq!(v.kind, BudgetKind::Depth);
        assert_eq!(v.message, "max search depth exceeded: 2 > 1");
    }

    /// Depth and state checks only run for new states.
    #[test]
    fn test_revisited_states_skip_search_checks() {
        let h = harness(BudgetConfig::unlimited().with_max_depth(1).with_max_states(1));
        let revisit = MockSearch { depth: 10, state_id: 10, new_state: false, replay: false };
        assert_eq!(h.governor.on_state_advanced(&revisit), HookOutcome::Continue);
        assert_eq!(h.governor.new_state_count(), 0);
    }

    /// Replayed states never count as new, however many are visited.
    #[test]
    fn test_trace_replay_does_not_count_new_states() {
        let h = harness(BudgetConfig::unlimited().with_max_new_states(1));
        for id in 1..=500 {
            let replayed = MockSearch { depth: id, state_id: id, new_state: true, replay: true };
            assert_eq!(h.governor.on_state_advanced(&replayed), HookOutcome::Continue);
        }
        assert_eq!(h.governor.new_state_count(), 0);
        assert!(h.sink.events().is_empty());
    }

    /// When several ceilings trip together, states wins over depth, and depth
    /// over new states.
    #[test]
    fn test_simultaneous_search_trips_follow_check_order() {
        let all = BudgetConfig::unlimited()
            .with_max_states(1)
            .with_max_depth(1)
            .with_max_new_states(1);
        let h = harness(all);
        h.governor.on_state_advanced(&MockSearch::fresh(1, 1));
        let outcome = h.governor.on_state_advanced(&MockSearch::fresh(2, 2));
        assert_eq!(outcome.violation().unwrap().kind, BudgetKind::States);

        let h = harness(BudgetConfig::unlimited().with_max_depth(1).with_max_new_states(1));
        h.governor.on_state_advanced(&MockSearch::fresh(1, 1));
        let outcome = h.governor.on_state_advanced(&MockSearch::fresh(2, 2));
        assert_eq!(outcome.violation().unwrap().kind, BudgetKind::Depth);
    }

    /// Time is checked before anything search-related, even for revisits.
    #[test]
    fn test_time_checked_on_every_state_advance() {
        let h = harness(
            BudgetConfig::unlimited()
                .with_max_time(std::time::Duration::from_millis(10))
                .with_max_states(1),
        );
        h.clock.advance(11);
        let revisit = MockSearch { depth: 5, state_id: 5, new_state: false, replay: false };
        let outcome = h.governor.on_state_advanced(&revisit);
        assert_eq!(outcome.violation().unwrap().kind, BudgetKind::Time);
    }

    // ── Instruction hook ─────────────────────────────────────────────────────

    /// Interval 100 with max_insn=99 trips on the 100th instruction.
    #[test]
    fn test_small_interval_catches_instruction_ceiling() {
        let config = BudgetConfig::unlimited()
            .with_max_instructions(99)
            .with_check_interval(100)
            .unwrap();
        let h = harness(config);
        let trips = run_instructions(&h.governor, 100);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].0, 100);
        assert_eq!(trips[0].1.violation().unwrap().kind, BudgetKind::Instructions);
    }

    /// The default interval never checks within the first 100 instructions.
    #[test]
    fn test_default_interval_skips_short_loops() {
        let h = harness(BudgetConfig::unlimited().with_max_instructions(99));
        assert!(run_instructions(&h.governor, 100).is_empty());
        assert_eq!(h.governor.instruction_count(), 100);
        assert!(h.sink.events().is_empty());
    }

    /// max_insn=15000 with the default interval fires at 20000, never earlier.
    #[test]
    fn test_instruction_ceiling_fires_at_next_check_point() {
        let h = harness(BudgetConfig::unlimited().with_max_instructions(15_000));
        let trips = run_instructions(&h.governor, 20_000);
        assert_eq!(trips.len(), 1);
        let (at, outcome) = &trips[0];
        assert_eq!(*at, 20_000);
        assert_eq!(
            outcome.violation().unwrap().message,
            "max instruction count exceeded: 20000 > 15000"
        );
    }

    /// Instruction-level trips interrupt the transition between notify and
    /// terminate.
    #[test]
    fn test_instruction_trip_interrupts_transition() {
        let config = BudgetConfig::unlimited()
            .with_max_instructions(1)
            .with_check_interval(2)
            .unwrap();
        let h = harness(config);
        run_instructions(&h.governor, 2);

        let events = h.sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], SinkEvent::Violated(m) if m.contains("instruction count")));
        assert_eq!(events[1], SinkEvent::Interrupted(BREAK_TRANSITION_REASON.to_string()));
        assert_eq!(events[2], SinkEvent::Terminate);
    }

    /// Time and heap are also evaluated at instruction check points.
    #[test]
    fn test_time_checked_at_instruction_check_point() {
        let config = BudgetConfig::unlimited()
            .with_max_time(std::time::Duration::from_millis(1))
            .with_check_interval(10)
            .unwrap();
        let h = harness(config);
        h.clock.advance(2);

        let trips = run_instructions(&h.governor, 10);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].0, 10);
        assert_eq!(trips[0].1.violation().unwrap().kind, BudgetKind::Time);
    }

    // ── Idempotence ──────────────────────────────────────────────────────────

    /// Once tripped, later hooks report nothing and request nothing.
    #[test]
    fn test_tripped_governor_never_reports_twice() {
        let h = harness(BudgetConfig::unlimited().with_max_states(1));
        h.governor.on_state_advanced(&MockSearch::fresh(1, 1));
        let first = h.governor.on_state_advanced(&MockSearch::fresh(2, 2));
        assert!(first.violation().is_some());

        for id in 3..50 {
            assert_eq!(
                h.governor.on_state_advanced(&MockSearch::fresh(id, id)),
                HookOutcome::AlreadyTripped
            );
        }
        for _ in 0..20_000 {
            assert_eq!(h.governor.on_instruction_executed(), HookOutcome::AlreadyTripped);
        }

        assert_eq!(h.sink.terminate_count(), 1);
        assert_eq!(h.sink.events().len(), 2);
        assert_eq!(h.governor.violation().unwrap().kind, BudgetKind::States);
    }

    /// Concurrent hook calls from many threads still produce one report.
    #[test]
    fn test_concurrent_trips_report_once() {
        let config = BudgetConfig::unlimited()
            .with_max_instructions(10)
            .with_check_interval(1)
            .unwrap();
        let h = harness(config);
        let governor = Arc::new(h.governor);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let governor = Arc::clone(&governor);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        governor.on_instruction_executed();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(governor.instruction_count(), 8_000);
        assert_eq!(h.sink.terminate_count(), 1);
        assert!(governor.is_tripped());
    }

    // ── Heap probe degradation ───────────────────────────────────────────────

    /// A failed baseline reading disables only the heap check.
    #[test]
    fn test_failed_baseline_disables_heap_only() {
        let clock = ManualClock::default();
        let heap = MockHeap::default();
        heap.failing.store(true, Ordering::Relaxed);
        let sink = RecordingSink::default();
        let governor = BudgetGovernor::new(
            BudgetConfig::unlimited().with_max_heap(1).with_max_depth(1),
            Box::new(clock.clone()),
            Box::new(heap.clone()),
            Box::new(sink.clone()),
        );

        assert!(!governor.heap_check_active());
        heap.failing.store(false, Ordering::Relaxed);
        heap.used.store(u64::MAX, Ordering::Relaxed);
        assert!(governor.heap_exceeded().is_none());

        let outcome = governor.on_state_advanced(&MockSearch::fresh(2, 2));
        assert_eq!(outcome.violation().unwrap().kind, BudgetKind::Depth);
    }

    /// A probe that fails mid-run disables the heap check from then on.
    #[test]
    fn test_failing_probe_mid_run_disables_heap_check() {
        let h = harness(BudgetConfig::unlimited().with_max_heap(MEGABYTE));
        h.heap.failing.store(true, Ordering::Relaxed);
        assert!(h.governor.heap_exceeded().is_none());
        assert!(!h.governor.heap_check_active());

        h.heap.failing.store(false, Ordering::Relaxed);
        h.heap.used.store(u64::MAX, Ordering::Relaxed);
        assert!(h.governor.heap_exceeded().is_none(), "heap check stays off");
        assert_eq!(h.governor.on_state_advanced(&MockSearch::fresh(1, 1)), HookOutcome::Continue);
    }

    // ── Snapshot ─────────────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_reflects_counters_and_violation() {
        let h = harness(BudgetConfig::unlimited().with_max_heap(100 * MEGABYTE).with_max_new_states(1));
        h.clock.advance(250);
        h.heap.used.store(52 * MEGABYTE, Ordering::Relaxed);
        for _ in 0..7 {
            h.governor.on_instruction_executed();
        }
        h.governor.on_state_advanced(&MockSearch::fresh(1, 1));
        h.governor.on_state_advanced(&MockSearch::fresh(2, 2));

        let snap = h.governor.snapshot();
        assert_eq!(snap.run_id, h.governor.run_id());
        assert_eq!(snap.elapsed_millis, 250);
        assert_eq!(snap.instruction_count, 7);
        assert_eq!(snap.new_state_count, 2);
        assert_eq!(snap.heap_growth_bytes, Some(2 * MEGABYTE));
        assert_eq!(snap.check_interval, 10_000);
        assert!(snap.tripped());
        assert_eq!(snap.violation.unwrap().kind, BudgetKind::NewStates);
    }

    #[test]
    fn test_clock_going_backwards_counts_as_zero_elapsed() {
        let clock = ManualClock::default();
        clock.advance(1_000);
        let governor = BudgetGovernor::new(
            BudgetConfig::unlimited().with_max_time(std::time::Duration::from_millis(1)),
            Box::new(clock.clone()),
            Box::new(MockHeap::default()),
            Box::new(RecordingSink::default()),
        );
        clock.now.store(0, Ordering::Relaxed);
        assert_eq!(governor.elapsed_millis(), 0);
        assert!(governor.time_exceeded().is_none());
    }
}
