//! # searchcap-config
//!
//! TOML configuration for the searchcap budget governor.
//!
//! ## Overview
//!
//! This crate provides [`BudgetConfigLoader`], which reads the `budget.*`
//! keys from a `[budget]` table, layers `key=value` overrides on top, and
//! resolves the result into a
//! [`BudgetConfig`](searchcap_contracts::budget::BudgetConfig).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use searchcap_config::BudgetConfigLoader;
//!
//! let loaded = BudgetConfigLoader::from_file(Path::new("budget.toml"))?.resolve()?;
//! for d in &loaded.diagnostics {
//!     eprintln!("{}: {}", d.key, d.message);
//! }
//! ```

pub mod loader;
pub mod section;
pub mod value;

pub use loader::{BudgetConfigLoader, ConfigDiagnostic, LoadedConfig};
pub use section::{BudgetFile, BudgetSection, RawValue};

// ── Tests ─────────────────────────────────────────────────────────────────────
