//! TOML-driven budget configuration loader.
//!
//! `BudgetConfigLoader` reads a `[budget]` table from a TOML string or file,
//! accepts `key=value` overrides on top, and resolves everything into an
//! immutable `BudgetConfig`.
//!
//! Resolution rules:
//!
//! 1. Absent keys and integers <= 0 leave the ceiling unlimited.
//! 2. Durations and byte sizes are parsed with their unit suffixes.
//! 3. A `check_interval` <= 0 is clamped to the default; the clamp is logged
//!    and reported as a `ConfigDiagnostic`, never silently applied.

use std::path::Path;

use tracing::{debug, warn};

use searchcap_contracts::{
    budget::{BudgetConfig, Ceiling, DEFAULT_CHECK_INTERVAL},
    error::{BudgetError, BudgetResult},
};

use crate::{
    section::{BudgetFile, BudgetSection, RawValue},
    value::{byte_size, duration_millis},
};

/// Something the loader changed or noticed while resolving a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiagnostic {
    /// Fully-qualified key, e.g. `budget.check_interval`.
    pub key: String,
    /// Human-readable explanation.
    pub message: String,
}

/// A resolved configuration plus any diagnostics produced on the way.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: BudgetConfig,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

/// Builds a `BudgetConfig` from TOML and command-line style overrides.
///
/// ```rust,ignore
/// use searchcap_config::BudgetConfigLoader;
///
/// let mut loader = BudgetConfigLoader::from_file(Path::new("budget.toml"))?;
/// loader.apply_override("+budget.max_state=3")?;
/// let loaded = loader.resolve()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct BudgetConfigLoader {
    section: BudgetSection,
}

impl BudgetConfigLoader {
    /// A loader with no keys set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `s` as TOML and keep its `[budget]` table.
    ///
    /// Returns `BudgetError::ConfigError` if the TOML is malformed or the
    /// table contains unknown keys or wrongly typed values.
    pub fn from_toml_str(s: &str) -> BudgetResult<Self> {
        let file: BudgetFile = toml::from_str(s).map_err(|e| BudgetError::ConfigError {
            reason: format!("failed to parse budget TOML: {}", e),
        })?;
        Ok(Self { section: file.budget })
    }

    /// Read the file at `path` and parse it as TOML budget configuration.
    pub fn from_file(path: &Path) -> BudgetResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BudgetError::ConfigError {
            reason: format!("failed to read budget file '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loading budget configuration");
        Self::from_toml_str(&contents)
    }

    /// The raw section as loaded and overridden so far.
    pub fn section(&self) -> &BudgetSection {
        &self.section
    }

    /// Apply one `key=value` override.
    ///
    /// The key may be written with or without the `budget.` prefix and the
    /// whole assignment may start with `+`, so model-checker style arguments
    /// such as `+budget.max_insn=1000` are accepted as-is.
    pub fn apply_override(&mut self, assignment: &str) -> BudgetResult<()> {
        let assignment = assignment.trim().trim_start_matches('+');
        let (key, value) = assignment.split_once('=').ok_or_else(|| BudgetError::ConfigError {
            reason: format!("override '{}' is not of the form key=value", assignment),
        })?;
        let key = key.trim();
        let value = value.trim();
        let short = key.strip_prefix("budget.").unwrap_or(key);

        match short {
            "max_time" => self.section.max_time = Some(RawValue::from_cli(value)),
            "max_heap" => self.section.max_heap = Some(RawValue::from_cli(value)),
            "max_depth" => self.section.max_depth = Some(parse_int(key, value)?),
            "max_insn" => self.section.max_insn = Some(parse_int(key, value)?),
            "max_state" => self.section.max_state = Some(parse_int(key, value)?),
            "max_new_states" => self.section.max_new_states = Some(parse_int(key, value)?),
            "check_interval" => self.section.check_interval = Some(parse_int(key, value)?),
            _ => {
                return Err(BudgetError::ConfigError {
                    reason: format!("unknown budget key '{}'", key),
                })
            }
        }

        debug!(key = %key, value = %value, "budget override applied");
        Ok(())
    }

    /// Apply several overrides in order; later ones win.
    pub fn apply_overrides<I, S>(&mut self, assignments: I) -> BudgetResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for assignment in assignments {
            self.apply_override(assignment.as_ref())?;
        }
        Ok(())
    }

    /// Turn the raw section into a validated `BudgetConfig`.
    pub fn resolve(&self) -> BudgetResult<LoadedConfig> {
        let s = &self.section;
        let mut diagnostics = Vec::new();

        let max_time = match &s.max_time {
            Some(v) => Ceiling::from_signed(duration_millis("budget.max_time", v)?),
            None => Ceiling::UNLIMITED,
        };
        let max_heap = match &s.max_heap {
            Some(v) => Ceiling::from_signed(byte_size("budget.max_heap", v)?),
            None => Ceiling::UNLIMITED,
        };
        let ceiling = |raw: Option<i64>| raw.map(Ceiling::from_signed).unwrap_or_default();

        let mut config = BudgetConfig {
            max_time,
            max_heap,
            max_depth: ceiling(s.max_depth),
            max_instructions: ceiling(s.max_insn),
            max_states: ceiling(s.max_state),
            max_new_states: ceiling(s.max_new_states),
            check_interval: DEFAULT_CHECK_INTERVAL,
        };

        match s.check_interval {
            Some(interval) if interval <= 0 => {
                warn!(
                    configured = interval,
                    default = DEFAULT_CHECK_INTERVAL.get(),
                    "non-positive budget.check_interval, clamping to default"
                );
                diagnostics.push(ConfigDiagnostic {
                    key: "budget.check_interval".to_string(),
                    message: format!(
                        "configured value {} is not positive; using default {}",
                        interval,
                        DEFAULT_CHECK_INTERVAL.get()
                    ),
                });
            }
            Some(interval) => config = config.with_check_interval(interval)?,
            None => {}
        }

        debug!(
            unlimited = config.is_unlimited(),
            check_interval = config.check_interval.get(),
            diagnostics = diagnostics.len(),
            "budget configuration resolved"
        );

        Ok(LoadedConfig { config, diagnostics })
    }
}

fn parse_int(key: &str, value: &str) -> BudgetResult<i64> {
    value.parse::<i64>().map_err(|_| BudgetError::ConfigError {
        reason: format!("invalid value '{}' for '{}': expected an integer", value, key),
    })
}
