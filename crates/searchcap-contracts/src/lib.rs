//! # searchcap-contracts
//!
//! Shared types for the searchcap budget governor.
//!
//! All crates in the workspace import from here. No enforcement logic lives
//! in this crate, only ceilings, configuration, violation records, and the
//! error type.

pub mod budget;
pub mod error;
pub mod format;
pub mod run;
pub mod violation;

#[cfg(test)]
mod tests {
    use super::*;
    use budget::{BudgetConfig, Ceiling, DEFAULT_CHECK_INTERVAL};
    use error::BudgetError;
    use format::{format_hms, format_megabytes, MEGABYTE};
    use run::RunId;
    use violation::{BudgetKind, HookOutcome, Violation};

    // ── Ceiling ──────────────────────────────────────────────────────────────

    #[test]
    fn ceiling_unlimited_is_never_exceeded() {
        for observed in [0, 1, 10_000, u64::MAX] {
            assert_eq!(Ceiling::UNLIMITED.exceeded_by(observed), None);
        }
    }

    #[test]
    fn ceiling_uses_strict_greater_than() {
        let c = Ceiling::new(3);
        assert_eq!(c.exceeded_by(2), None);
        assert_eq!(c.exceeded_by(3), None, "observed == limit must not trip");
        assert_eq!(c.exceeded_by(4), Some(3));
    }

    #[test]
    fn ceiling_from_signed_treats_non_positive_as_unlimited() {
        assert!(!Ceiling::from_signed(0).is_set());
        assert!(!Ceiling::from_signed(-1).is_set());
        assert!(!Ceiling::from_signed(i64::MIN).is_set());
        assert_eq!(Ceiling::from_signed(42).get(), Some(42));
        assert_eq!(Ceiling::new(0), Ceiling::UNLIMITED);
    }

    // ── BudgetConfig ─────────────────────────────────────────────────────────

    #[test]
    fn default_config_is_unlimited_with_default_interval() {
        let config = BudgetConfig::default();
        assert!(config.is_unlimited());
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
        assert_eq!(config.check_interval.get(), 10_000);
    }

    #[test]
    fn builder_sets_ceilings() {
        let config = BudgetConfig::unlimited()
            .with_max_time(std::time::Duration::from_secs(2))
            .with_max_states(3);
        assert_eq!(config.max_time.get(), Some(2000));
        assert_eq!(config.max_states.get(), Some(3));
        assert!(!config.is_unlimited());
    }

    #[test]
    fn non_positive_check_interval_is_rejected() {
        for bad in [0, -1, -10_000] {
            match BudgetConfig::unlimited().with_check_interval(bad) {
                Err(BudgetError::InvalidCheckInterval { value }) => assert_eq!(value, bad),
                other => panic!("expected InvalidCheckInterval, got {:?}", other),
            }
        }
        let config = BudgetConfig::unlimited().with_check_interval(100).unwrap();
        assert_eq!(config.check_interval.get(), 100);
    }

    // ── Formatting ───────────────────────────────────────────────────────────

    #[test]
    fn format_hms_pads_components() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(999), "00:00:00");
        assert_eq!(format_hms(61_000), "00:01:01");
        assert_eq!(format_hms(3_723_000), "01:02:03");
        assert_eq!(format_hms(360_000_000), "100:00:00");
    }

    #[test]
    fn format_megabytes_truncates() {
        assert_eq!(format_megabytes(0), "0MB");
        assert_eq!(format_megabytes(MEGABYTE - 1), "0MB");
        assert_eq!(format_megabytes(90 * MEGABYTE), "90MB");
    }

    // ── Violation messages ───────────────────────────────────────────────────

    #[test]
    fn violation_messages_name_kind_observed_and_limit() {
        let states = Violation::new(BudgetKind::States, 4, 3);
        assert!(states.message.contains("states exceeded"));
        assert!(states.message.contains('4') && states.message.contains('3'));

        let depth = Violation::new(BudgetKind::Depth, 2, 1);
        assert_eq!(depth.to_string(), "max search depth exceeded: 2 > 1");

        let insn = Violation::new(BudgetKind::Instructions, 20_000, 15_000);
        assert_eq!(insn.message, "max instruction count exceeded: 20000 > 15000");

        let fresh = Violation::new(BudgetKind::NewStates, 4, 3);
        assert!(fresh.message.starts_with("max new state count exceeded"));
    }

    #[test]
    fn time_violation_uses_hms() {
        let v = Violation::new(BudgetKind::Time, 3_723_000, 3_600_000);
        assert!(v.message.starts_with("max time exceeded"));
        assert!(v.message.contains("01:02:03"));
        assert!(v.message.contains("01:00:00"));
    }

    #[test]
    fn heap_violation_uses_megabytes() {
        let v = Violation::new(BudgetKind::Heap, 120 * MEGABYTE, 100 * MEGABYTE);
        assert_eq!(v.message, "max heap exceeded: 120MB > 100MB");
    }

    #[test]
    fn budget_kind_config_keys() {
        let keys: Vec<&str> = BudgetKind::ALL.iter().map(|k| k.config_key()).collect();
        assert!(keys.contains(&"budget.max_insn"));
        assert!(keys.contains(&"budget.max_state"));
        assert_eq!(keys.len(), 6);
    }

    // ── HookOutcome ──────────────────────────────────────────────────────────

    #[test]
    fn hook_outcome_terminality() {
        assert!(!HookOutcome::Continue.is_terminal());
        assert!(HookOutcome::AlreadyTripped.is_terminal());
        let v = Violation::new(BudgetKind::Depth, 2, 1);
        let outcome = HookOutcome::Violated(v.clone());
        assert!(outcome.is_terminal());
        assert_eq!(outcome.violation(), Some(&v));
        assert_eq!(HookOutcome::AlreadyTripped.violation(), None);
    }

    #[test]
    fn violation_serializes_kind_as_snake_case() {
        let v = Violation::new(BudgetKind::NewStates, 5, 4);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "new_states");
        assert_eq!(json["observed"], 5);
    }

    // ── RunId ────────────────────────────────────────────────────────────────

    #[test]
    fn run_id_new_produces_unique_values() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| RunId::new().to_string()).collect();
        assert_eq!(ids.len(), 100);
    }

    // ── BudgetError display messages ─────────────────────────────────────────

    #[test]
    fn error_display_messages() {
        let err = BudgetError::ConfigError { reason: "bad key".to_string() };
        assert!(err.to_string().contains("configuration error"));
        assert!(err.to_string().contains("bad key"));

        let err = BudgetError::InvalidCheckInterval { value: 0 };
        assert!(err.to_string().contains("check interval must be positive"));

        let err = BudgetError::MeasurementUnavailable {
            source_name: "heap".to_string(),
            reason: "no such process".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("heap"));
        assert!(msg.contains("no such process"));
    }
}
