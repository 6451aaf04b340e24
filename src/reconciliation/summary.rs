//! Read-only views over reconciled entries: totals, filters and search

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Aggregate figures for a reconciled data set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub matched: usize,
    pub partial: usize,
    /// Pending and unmatched registrations together
    pub pending: usize,
    /// Bank entries nobody has claimed
    pub unclaimed_bank_entries: usize,
    /// Sum of every registration amount
    pub total_expected: BigDecimal,
    /// Sum of every bank entry amount, synthetic ones included
    pub total_received: BigDecimal,
    /// Received minus expected
    pub difference: BigDecimal,
}

impl ReconciliationSummary {
    pub fn from_entries(registrations: &[RegistrationEntry], bank_entries: &[BankEntry]) -> Self {
        let count = |status: RegistrationStatus| {
            registrations.iter().filter(|r| r.status == status).count()
        };
        let total_expected: BigDecimal = registrations.iter().map(|r| &r.total_amount).sum();
        let total_received: BigDecimal = bank_entries.iter().map(|b| &b.amount).sum();
        let difference = &total_received - &total_expected;

        Self {
            matched: count(RegistrationStatus::Matched),
            partial: count(RegistrationStatus::Partial),
            pending: registrations.iter().filter(|r| r.status.is_open()).count(),
            unclaimed_bank_entries: bank_entries.iter().filter(|b| b.is_available()).count(),
            total_expected,
            total_received,
            difference,
        }
    }

    pub fn from_set(set: &EntrySet) -> Self {
        Self::from_entries(&set.registrations, &set.bank_entries)
    }
}

/// Status filter offered to the operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Matched,
    Partial,
    /// Pending and unmatched
    Pending,
}

impl StatusFilter {
    pub fn accepts(&self, status: RegistrationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Matched => status == RegistrationStatus::Matched,
            StatusFilter::Partial => status == RegistrationStatus::Partial,
            StatusFilter::Pending => status.is_open(),
        }
    }
}

fn status_rank(status: RegistrationStatus) -> u8 {
    match status {
        RegistrationStatus::Matched => 2,
        RegistrationStatus::Partial => 1,
        RegistrationStatus::Pending | RegistrationStatus::Unmatched => 0,
    }
}

/// Registrations whose name or tail contains `query` and whose status passes
/// `filter`, matched first, then partial, then open. Ties keep roster order.
pub fn filter_registrations<'a>(
    registrations: &'a [RegistrationEntry],
    query: &str,
    filter: StatusFilter,
) -> Vec<&'a RegistrationEntry> {
    let mut found: Vec<&RegistrationEntry> = registrations
        .iter()
        .filter(|r| r.player_name.contains(query) || r.last_five_digits.contains(query))
        .filter(|r| filter.accepts(r.status))
        .collect();
    found.sort_by_key(|r| std::cmp::Reverse(status_rank(r.status)));
    found
}

/// Available bank entries whose tail, message, note or counterpart bank
/// contains `query`
pub fn unclaimed_bank_entries<'a>(bank_entries: &'a [BankEntry], query: &str) -> Vec<&'a BankEntry> {
    bank_entries
        .iter()
        .filter(|b| b.is_available())
        .filter(|b| {
            query.is_empty()
                || b.last_five_digits.contains(query)
                || b.message.contains(query)
                || b.note.contains(query)
                || b.bank_info.contains(query)
        })
        .collect()
}

/// Registrations a bank entry may still be bound to, narrowed by name, tail
/// or amount
pub fn binding_candidates<'a>(
    registrations: &'a [RegistrationEntry],
    query: &str,
) -> Vec<&'a RegistrationEntry> {
    registrations
        .iter()
        .filter(|r| r.status != RegistrationStatus::Matched)
        .filter(|r| {
            query.is_empty()
                || r.player_name.contains(query)
                || r.last_five_digits.contains(query)
                || r.total_amount.to_string().contains(query)
        })
        .collect()
}
