//! Parsing of duration and byte-size values.
//!
//! Durations: a bare integer is milliseconds; strings may carry `ms`, `s`,
//! `m` or `h`, or use `H:MM:SS` / `M:SS`. Byte sizes: a bare integer is
//! bytes; strings may carry `k`, `m` or `g` (binary multiples, case
//! insensitive, optional trailing `b`). Results stay signed so that <= 0 can
//! still mean "unlimited".

use searchcap_contracts::error::{BudgetError, BudgetResult};

use crate::section::RawValue;

/// Resolve a duration value to milliseconds.
pub fn duration_millis(key: &str, value: &RawValue) -> BudgetResult<i64> {
    let text = match value {
        RawValue::Int(n) => return Ok(*n),
        RawValue::Text(s) => s.trim(),
    };

    if text.contains(':') {
        return clock_notation_millis(key, text);
    }

    let (number, unit) = split_unit(text);
    let factor = match unit.to_ascii_lowercase().as_str() {
        "" | "ms" => 1,
        "s" => 1_000,
        "m" | "min" => 60_000,
        "h" => 3_600_000,
        other => {
            return Err(invalid(key, text, &format!("unknown duration unit '{other}'")));
        }
    };
    scale(key, text, number, factor)
}

/// Resolve a byte-size value to bytes.
pub fn byte_size(key: &str, value: &RawValue) -> BudgetResult<i64> {
    let text = match value {
        RawValue::Int(n) => return Ok(*n),
        RawValue::Text(s) => s.trim(),
    };

    let (number, unit) = split_unit(text);
    let unit = unit.to_ascii_lowercase();
    let factor = match unit.trim_end_matches('b') {
        "" => 1,
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        _ => return Err(invalid(key, text, &format!("unknown size unit '{unit}'"))),
    };
    scale(key, text, number, factor)
}

/// Parse `H:MM:SS` or `M:SS`.
fn clock_notation_millis(key: &str, text: &str) -> BudgetResult<i64> {
    let parts = text
        .split(':')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(key, text, &e.to_string()))?;

    let (h, m, s) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(invalid(key, text, "expected H:MM:SS or M:SS")),
    };
    if parts.iter().any(|p| *p < 0) || (parts.len() == 3 && m >= 60) || s >= 60 {
        return Err(invalid(key, text, "clock components out of range"));
    }

    h.checked_mul(3600)
        .and_then(|v| v.checked_add(m.checked_mul(60)?))
        .and_then(|v| v.checked_add(s))
        .and_then(|v| v.checked_mul(1000))
        .ok_or_else(|| invalid(key, text, "value overflows"))
}

/// Split a leading (optionally negative) integer from its unit suffix.
fn split_unit(text: &str) -> (&str, &str) {
    let digits_end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (&text[..digits_end], text[digits_end..].trim())
}

fn scale(key: &str, text: &str, number: &str, factor: i64) -> BudgetResult<i64> {
    let n: i64 = number
        .parse()
        .map_err(|_| invalid(key, text, "expected an integer with an optional unit"))?;
    n.checked_mul(factor)
        .ok_or_else(|| invalid(key, text, "value overflows"))
}

fn invalid(key: &str, text: &str, detail: &str) -> BudgetError {
    BudgetError::ConfigError {
        reason: format!("invalid value '{text}' for '{key}': {detail}"),
    }
}
