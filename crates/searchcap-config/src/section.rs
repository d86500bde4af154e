//! The `[budget]` table as it appears on disk.
//!
//! Values are kept raw here: durations and byte sizes may be integers or
//! suffixed strings, and integers <= 0 keep their "unlimited" meaning until
//! `BudgetConfigLoader::resolve` turns the section into a `BudgetConfig`.
//!
//! Example:
//! ```toml
//! [budget]
//! max_time = "5m"
//! max_heap = "512M"
//! max_depth = 100
//! max_insn = 1000000
//! max_state = 50000
//! max_new_states = 40000
//! check_interval = 10000
//! ```

use serde::{Deserialize, Serialize};

/// A duration or byte-size value: either a bare integer or a string with a
/// unit suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Text(String),
}

impl RawValue {
    /// Interpret a command-line value: integers stay integers, anything else
    /// is kept as text for suffix parsing.
    pub fn from_cli(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(n) => RawValue::Int(n),
            Err(_) => RawValue::Text(value.trim().to_string()),
        }
    }
}

/// Every recognised key of the `[budget]` table. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetSection {
    /// Wall-clock ceiling; bare integers are milliseconds.
    pub max_time: Option<RawValue>,

    /// Heap growth ceiling; bare integers are bytes.
    pub max_heap: Option<RawValue>,

    pub max_depth: Option<i64>,

    pub max_insn: Option<i64>,

    pub max_state: Option<i64>,

    pub max_new_states: Option<i64>,

    /// Instructions between expensive checks. Values <= 0 are clamped to the
    /// default when resolved.
    pub check_interval: Option<i64>,
}

/// The top-level document. Other tables may be present and are ignored, so a
/// budget section can live inside a larger host configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetFile {
    #[serde(default)]
    pub budget: BudgetSection,
}
