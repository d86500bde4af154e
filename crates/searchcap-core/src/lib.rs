//! # searchcap-core
//!
//! A resource budget governor for state-space search hosts.
//!
//! This crate provides:
//! - The four capability traits (`Clock`, `HeapProbe`, `SearchProbe`,
//!   `TerminationSink`) a host implements or reuses
//! - The `BudgetGovernor` that evaluates six ceilings at two hook points
//! - System-backed defaults (`SystemClock`, `ProcessHeapProbe`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use searchcap_core::BudgetGovernor;
//!
//! let governor = BudgetGovernor::with_system_probes(config, Box::new(host_sink));
//! // per instruction:
//! governor.on_instruction_executed();
//! // per completed transition:
//! governor.on_state_advanced(&search);
//! ```

pub mod governor;
pub mod probe;
pub mod traits;

pub use governor::BudgetGovernor;
pub use probe::{ProcessHeapProbe, SystemClock, UnavailableHeapProbe};
