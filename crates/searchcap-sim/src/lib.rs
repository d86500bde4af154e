//! # searchcap-sim
//!
//! A simulated state-space search host for the searchcap governor.
//!
//! `SimulatedSearch` implements `SearchProbe`, `HostSignals` implements
//! `TerminationSink`, and `scenarios` bundles reproducible governed runs
//! used by the demo CLI and by the tests below.

pub mod host;
pub mod scenarios;
pub mod search;

pub use host::HostSignals;
pub use scenarios::{catalog, find, run_scenario, run_search, Scenario, ScenarioOutcome};
pub use search::{SearchReport, SearchShape, SimulatedSearch};

// ── Tests ─────────────────────────────────────────────────────────────────────
