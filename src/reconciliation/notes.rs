//! Human-readable explanations attached to registrations

use bigdecimal::BigDecimal;

use crate::types::{
    BankEntry, RegistrationEntry, MANUAL_BINDING_MARKER, MANUAL_INJECTION_MARKER,
    MESSAGE_MATCH_MARKER,
};
use crate::utils::format_money;

const DEFAULT_DEPOSIT_LABEL: &str = "bank deposit";

/// Wording for a signed difference (bank minus expected)
fn difference_clause(diff: &BigDecimal) -> Option<String> {
    let zero = BigDecimal::from(0);
    if *diff > zero {
        Some(format!("excess {}", format_money(diff)))
    } else if *diff < zero {
        Some(format!("shortfall {}", format_money(&diff.abs())))
    } else {
        None
    }
}

/// Pass 1
pub fn exact_match(bank: &BankEntry) -> String {
    let label = if bank.note.trim().is_empty() {
        DEFAULT_DEPOSIT_LABEL
    } else {
        bank.note.as_str()
    };
    format!(
        "Matched bank deposit: {} - {}",
        label,
        format_money(&bank.amount)
    )
}

/// Pass 2
pub fn group_sum(group_total: &BigDecimal, bank_total: &BigDecimal) -> String {
    let head = format!(
        "Group total {}, bank {}",
        format_money(group_total),
        format_money(bank_total)
    );
    match difference_clause(&(bank_total - group_total)) {
        Some(clause) => format!("{head}, {clause}"),
        None => format!("{head}, sufficient"),
    }
}

/// Pass 3
pub fn tail_only(registration: &RegistrationEntry, bank: &BankEntry) -> String {
    let diff = &bank.amount - &registration.total_amount;
    let clause = difference_clause(&diff).unwrap_or_else(|| "equal".to_string());
    format!(
        "Tail digits match, amount {} (bank {})",
        clause,
        format_money(&bank.amount)
    )
}

/// Pass 4
pub fn message_match(registration: &RegistrationEntry, bank: &BankEntry) -> String {
    let bank_tail = if bank.last_five_digits.trim().is_empty() {
        "none"
    } else {
        bank.last_five_digits.as_str()
    };
    let mut note = format!(
        "{} bank message contains \"{}\", tail digits {} (expected {})",
        MESSAGE_MATCH_MARKER, registration.player_name, bank_tail, registration.last_five_digits
    );
    if let Some(clause) = difference_clause(&(&bank.amount - &registration.total_amount)) {
        note.push_str(", ");
        note.push_str(&clause);
    }
    note
}

pub fn manual_injection(reason: &str) -> String {
    format!("{MANUAL_INJECTION_MARKER} {reason}")
}

/// Remittance message placed on a synthetic bank entry
pub fn manual_injection_message(player_name: &str) -> String {
    format!("Manual entry - {player_name}")
}

pub fn manual_binding(registration: &RegistrationEntry, bank: &BankEntry) -> String {
    let mut note = format!(
        "{} bank {} ({} {})",
        MANUAL_BINDING_MARKER,
        format_money(&bank.amount),
        bank.date,
        bank.time
    );
    if let Some(clause) = difference_clause(&(&bank.amount - &registration.total_amount)) {
        note.push(' ');
        note.push_str(&clause);
    }
    note
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(amount: i64) -> RegistrationEntry {
        RegistrationEntry::new(
            "reg-1".to_string(),
            "Alice".to_string(),
            BigDecimal::from(amount),
            "12345".to_string(),
            String::new(),
        )
    }

    fn bank(amount: i64) -> BankEntry {
        BankEntry::new("bank-1".to_string(), BigDecimal::from(amount), "00000".to_string())
    }

    #[test]
    fn test_exact_match_uses_default_label() {
        assert_eq!(
            exact_match(&bank(1500)),
            "Matched bank deposit: bank deposit - $1,500"
        );
        assert_eq!(
            exact_match(&bank(1500).with_note("ATM transfer")),
            "Matched bank deposit: ATM transfer - $1,500"
        );
    }

    #[test]
    fn test_group_sum_wording() {
        let thousand = BigDecimal::from(1000);
        assert_eq!(
            group_sum(&thousand, &thousand),
            "Group total $1,000, bank $1,000, sufficient"
        );
        assert_eq!(
            group_sum(&thousand, &BigDecimal::from(1200)),
            "Group total $1,000, bank $1,200, excess $200"
        );
        assert_eq!(
            group_sum(&thousand, &BigDecimal::from(700)),
            "Group total $1,000, bank $700, shortfall $300"
        );
    }

    #[test]
    fn test_message_match_mentions_tails_and_difference() {
        let note = message_match(&registration(1000), &bank(800));
        assert_eq!(
            note,
            "[message match] bank message contains \"Alice\", tail digits 00000 (expected 12345), shortfall $200"
        );

        let no_tail = BankEntry::new("b".to_string(), BigDecimal::from(1000), String::new());
        assert!(message_match(&registration(1000), &no_tail).contains("tail digits none"));
    }

    #[test]
    fn test_manual_binding_wording() {
        let bank = bank(1200).with_timestamp("2024/05/01", "10:30");
        assert_eq!(
            manual_binding(&registration(1000), &bank),
            "[manual match] bank $1,200 (2024/05/01 10:30) excess $200"
        );
        assert_eq!(
            manual_binding(&registration(1200), &bank),
            "[manual match] bank $1,200 (2024/05/01 10:30)"
        );
    }
}
