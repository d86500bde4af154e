//! Canned budget scenarios.
//!
//! Each scenario pairs a `[budget]` TOML document with a search shape and
//! the budget kind expected to end the run (or none, for runs that must
//! complete). They double as living documentation of the governor's
//! boundary behaviour.

use std::time::Duration;

use tracing::info;

use searchcap_config::BudgetConfigLoader;
use searchcap_contracts::{budget::BudgetConfig, error::BudgetResult, violation::BudgetKind};
use searchcap_core::BudgetGovernor;

use crate::{
    host::HostSignals,
    search::{SearchReport, SearchShape, SimulatedSearch},
};

/// One named, reproducible governed run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub budget_toml: &'static str,
    pub shape: SearchShape,
    /// The budget expected to stop the run; `None` if it must complete.
    pub expected: Option<BudgetKind>,
}

/// The result of running one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: &'static str,
    pub expected: Option<BudgetKind>,
    pub report: SearchReport,
}

impl ScenarioOutcome {
    /// The budget that actually stopped the run.
    pub fn observed(&self) -> Option<BudgetKind> {
        self.report.snapshot.violation.as_ref().map(|v| v.kind)
    }

    /// True if the run ended the way the scenario predicts.
    pub fn matched(&self) -> bool {
        self.observed() == self.expected && self.report.completed == self.expected.is_none()
    }
}

/// Every built-in scenario, in presentation order.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "state-ceiling",
            description: "max_state = 3 stops the fourth transition",
            budget_toml: "[budget]\nmax_state = 3\n",
            shape: SearchShape { branching: 2, max_depth: 3, instructions_per_transition: 10, ..SearchShape::default() },
            expected: Some(BudgetKind::States),
        },
        Scenario {
            name: "depth-ceiling",
            description: "max_depth = 1 stops the first branch reaching depth 2",
            budget_toml: "[budget]\nmax_depth = 1\n",
            shape: SearchShape { branching: 1, max_depth: 3, instructions_per_transition: 10, ..SearchShape::default() },
            expected: Some(BudgetKind::Depth),
        },
        Scenario {
            name: "instruction-ceiling",
            description: "max_insn = 15000 is caught at the 20000th instruction check point",
            budget_toml: "[budget]\nmax_insn = 15000\n",
            shape: SearchShape { branching: 2, max_depth: 4, instructions_per_transition: 1_000, ..SearchShape::default() },
            expected: Some(BudgetKind::Instructions),
        },
        Scenario {
            name: "time-ceiling",
            description: "max_time = 1ms stops a search whose transitions take 2ms",
            budget_toml: "[budget]\nmax_time = 1\n",
            shape: SearchShape {
                branching: 2,
                max_depth: 3,
                instructions_per_transition: 10,
                transition_delay: Some(Duration::from_millis(2)),
                ..SearchShape::default()
            },
            expected: Some(BudgetKind::Time),
        },
        Scenario {
            name: "heap-ceiling",
            description: "max_heap = 4M stops a search retaining 256K per transition",
            budget_toml: "[budget]\nmax_heap = \"4M\"\n",
            shape: SearchShape {
                branching: 2,
                max_depth: 6,
                instructions_per_transition: 10,
                bytes_per_transition: 256 * 1024,
                ..SearchShape::default()
            },
            expected: Some(BudgetKind::Heap),
        },
        Scenario {
            name: "new-state-ceiling",
            description: "max_new_states = 3 ignores 5 replayed states and stops at the 4th explored one",
            budget_toml: "[budget]\nmax_new_states = 3\n",
            shape: SearchShape { branching: 2, max_depth: 3, instructions_per_transition: 10, replay_prefix: 5, ..SearchShape::default() },
            expected: Some(BudgetKind::NewStates),
        },
        Scenario {
            name: "replay-only",
            description: "a run made only of trace replay never counts a new state",
            budget_toml: "[budget]\nmax_new_states = 1\n",
            shape: SearchShape { branching: 2, max_depth: 0, instructions_per_transition: 10, replay_prefix: 50, ..SearchShape::default() },
            expected: None,
        },
        Scenario {
            name: "unlimited",
            description: "no ceilings: the whole tree is explored",
            budget_toml: "",
            shape: SearchShape { branching: 2, max_depth: 4, instructions_per_transition: 100, revisit_every: Some(5), ..SearchShape::default() },
            expected: None,
        },
    ]
}

/// Look up a scenario by name.
pub fn find(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.name == name)
}

/// Run a scenario against a governor backed by the system clock and the
/// current process's memory.
pub fn run_scenario(scenario: &Scenario) -> BudgetResult<ScenarioOutcome> {
    let loaded = BudgetConfigLoader::from_toml_str(scenario.budget_toml)?.resolve()?;
    let report = run_search(loaded.config, scenario.shape.clone());

    let outcome = ScenarioOutcome {
        name: scenario.name,
        expected: scenario.expected,
        report,
    };

    info!(
        scenario = scenario.name,
        expected = ?outcome.expected,
        observed = ?outcome.observed(),
        transitions = outcome.report.transitions,
        matched = outcome.matched(),
        "scenario finished"
    );

    Ok(outcome)
}

/// Run one simulated search under `config` with system probes.
pub fn run_search(config: BudgetConfig, shape: SearchShape) -> SearchReport {
    let signals = HostSignals::new();
    let governor = BudgetGovernor::with_system_probes(config, Box::new(signals.clone()));
    SimulatedSearch::new(shape, signals).run(&governor)
}
