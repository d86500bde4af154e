//! Budget ceilings and the immutable governor configuration.
//!
//! A ceiling is either unlimited or a strictly positive limit. The
//! "sentinel <= 0 means unlimited" convention of configuration files is
//! folded into `Ceiling::from_signed`, so code past the loader never sees a
//! zero or negative limit.

use std::num::NonZeroU64;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, BudgetResult};

/// Instructions between two evaluations of the expensive time/heap/instruction
/// checks when nothing else is configured.
pub const DEFAULT_CHECK_INTERVAL: NonZeroU64 = match NonZeroU64::new(10_000) {
    Some(n) => n,
    None => unreachable!(),
};

/// An optional upper bound on one resource signal.
///
/// `Ceiling::UNLIMITED` never reports a violation. A set ceiling is
/// violated only when the observed value strictly exceeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ceiling(Option<NonZeroU64>);

impl Ceiling {
    /// The ceiling that is never exceeded.
    pub const UNLIMITED: Self = Self(None);

    /// A ceiling at `limit`; a zero limit is treated as unlimited.
    pub fn new(limit: u64) -> Self {
        Self(NonZeroU64::new(limit))
    }

    /// Build a ceiling from a signed configuration value. Anything <= 0 is
    /// unlimited.
    pub fn from_signed(raw: i64) -> Self {
        if raw <= 0 {
            Self::UNLIMITED
        } else {
            Self::new(raw.unsigned_abs())
        }
    }

    /// The configured limit, if any.
    pub fn get(self) -> Option<u64> {
        self.0.map(NonZeroU64::get)
    }

    /// True if a limit is configured.
    pub fn is_set(self) -> bool {
        self.0.is_some()
    }

    /// Return the limit if `observed` strictly exceeds it.
    pub fn exceeded_by(self, observed: u64) -> Option<u64> {
        self.get().filter(|&limit| observed > limit)
    }
}

impl From<u64> for Ceiling {
    fn from(limit: u64) -> Self {
        Self::new(limit)
    }
}

/// The six ceilings plus the instruction-hook throttling period.
///
/// Constructed once per search run and never mutated afterwards. Time is in
/// milliseconds and heap in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Wall-clock ceiling in milliseconds.
    pub max_time: Ceiling,
    /// Heap growth ceiling in bytes, measured from governor attachment.
    pub max_heap: Ceiling,
    /// Search depth ceiling.
    pub max_depth: Ceiling,
    /// Executed instruction ceiling.
    pub max_instructions: Ceiling,
    /// Ceiling on the host's cumulative state identifier.
    pub max_states: Ceiling,
    /// Ceiling on new states that were not reached by trace replay.
    pub max_new_states: Ceiling,
    /// Instruction-hook invocations between expensive checks.
    pub check_interval: NonZeroU64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_time: Ceiling::UNLIMITED,
            max_heap: Ceiling::UNLIMITED,
            max_depth: Ceiling::UNLIMITED,
            max_instructions: Ceiling::UNLIMITED,
            max_states: Ceiling::UNLIMITED,
            max_new_states: Ceiling::UNLIMITED,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

impl BudgetConfig {
    /// A configuration with every ceiling unset and the default interval.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_time(mut self, limit: Duration) -> Self {
        self.max_time = Ceiling::new(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_max_heap(mut self, bytes: u64) -> Self {
        self.max_heap = Ceiling::new(bytes);
        self
    }

    pub fn with_max_depth(mut self, depth: u64) -> Self {
        self.max_depth = Ceiling::new(depth);
        self
    }

    pub fn with_max_instructions(mut self, count: u64) -> Self {
        self.max_instructions = Ceiling::new(count);
        self
    }

    pub fn with_max_states(mut self, state_id: u64) -> Self {
        self.max_states = Ceiling::new(state_id);
        self
    }

    pub fn with_max_new_states(mut self, count: u64) -> Self {
        self.max_new_states = Ceiling::new(count);
        self
    }

    /// Set the throttling period.
    ///
    /// Returns `BudgetError::InvalidCheckInterval` for values <= 0; a zero
    /// modulus or an "every instruction" interval must never slip in by
    /// accident.
    pub fn with_check_interval(mut self, interval: i64) -> BudgetResult<Self> {
        let interval = u64::try_from(interval)
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or(BudgetError::InvalidCheckInterval { value: interval })?;
        self.check_interval = interval;
        Ok(self)
    }

    /// True if no ceiling is configured at all.
    pub fn is_unlimited(&self) -> bool {
        [
            self.max_time,
            self.max_heap,
            self.max_depth,
            self.max_instructions,
            self.max_states,
            self.max_new_states,
        ]
        .iter()
        .all(|c| !c.is_set())
    }
}
