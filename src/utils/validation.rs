//! Validation and normalization helpers shared by import and overrides

use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Number of trailing account characters used as a join key
pub const TAIL_DIGITS_LEN: usize = 5;

/// Parse a loosely formatted amount such as `NT$1,200` or `1200元`.
///
/// Every character other than ASCII digits and `.` is dropped, then the
/// leading decimal is read (a second `.` ends it). Returns `None` when no
/// digit survives.
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut number = String::with_capacity(kept.len() + 1);
    let mut seen_dot = false;
    for c in kept.chars() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        number.push(c);
    }

    let number = number.trim_end_matches('.');
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if number.starts_with('.') {
        BigDecimal::from_str(&format!("0{number}")).ok()
    } else {
        BigDecimal::from_str(number).ok()
    }
}

/// Trim and keep at most the last five characters
pub fn normalize_tail_digits(raw: &str) -> String {
    let trimmed = raw.trim();
    let count = trimmed.chars().count();
    trimmed
        .chars()
        .skip(count.saturating_sub(TAIL_DIGITS_LEN))
        .collect()
}

/// Tail digits usable as a join key
pub fn has_tail_digits(tail: &str) -> bool {
    !tail.trim().is_empty()
}

/// Trimmed operator reason, or `None` when blank
pub fn override_reason(reason: &str) -> Option<&str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Whether an amount can stand for an expected payment
pub fn is_positive_amount(amount: &BigDecimal) -> bool {
    *amount > BigDecimal::from(0)
}
