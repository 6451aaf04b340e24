//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Marker written into the summary of a synthetic bank entry and at the
/// start of the note of the registration it pays for.
pub const MANUAL_INJECTION_MARKER: &str = "[manual entry]";

/// Marker at the start of the note of a manually bound registration.
pub const MANUAL_BINDING_MARKER: &str = "[manual match]";

/// Marker at the start of the note of a registration matched by bank message.
pub const MESSAGE_MATCH_MARKER: &str = "[message match]";

/// Reconciliation state of an expected payment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Nothing matched yet
    #[default]
    Pending,
    /// A candidate exists but the amounts need a human to confirm
    Partial,
    /// Paid
    Matched,
    /// Explicitly unresolved; treated like `Pending` by every pass
    Unmatched,
}

impl RegistrationStatus {
    /// Pending and unmatched are both "not paid, no candidate"
    pub fn is_open(&self) -> bool {
        matches!(self, RegistrationStatus::Pending | RegistrationStatus::Unmatched)
    }
}

/// Whether a bank entry can still be claimed by a registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankStatus {
    #[default]
    Available,
    Matched,
}

/// Who decided the current state of an entry.
///
/// Automatic entries are recomputed on every engine run. Manual ones are
/// held out of the engine and passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    #[default]
    Automatic,
    /// Paid through a channel missing from the bank feed; a synthetic bank
    /// entry was created for it
    ManualInjection,
    /// Operator paired an existing bank entry with a registration
    ManualBinding,
}

impl MatchSource {
    pub fn is_manual(&self) -> bool {
        !matches!(self, MatchSource::Automatic)
    }
}

/// One expected payment from the registration roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEntry {
    /// Unique identifier
    pub id: String,
    /// Name of the player the payment is for
    pub player_name: String,
    /// Amount expected from this registration
    pub total_amount: BigDecimal,
    /// Tail of the remitting account; may be shorter than five or empty
    pub last_five_digits: String,
    /// Free text from the roster, informational only
    #[serde(default)]
    pub full_note: String,
    #[serde(default)]
    pub status: RegistrationStatus,
    /// Linked bank entry id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
    /// Explanation of the current status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation_note: Option<String>,
    /// Matched through the bank message rather than tail digits
    #[serde(default)]
    pub message_matched: bool,
    /// Tail of the bank entry found by message; can differ from ours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_bank_digits: Option<String>,
    #[serde(default)]
    pub match_source: MatchSource,
}

impl RegistrationEntry {
    /// Create a new pending registration
    pub fn new(
        id: String,
        player_name: String,
        total_amount: BigDecimal,
        last_five_digits: String,
        full_note: String,
    ) -> Self {
        Self {
            id,
            player_name,
            total_amount,
            last_five_digits,
            full_note,
            status: RegistrationStatus::Pending,
            matched_id: None,
            reconciliation_note: None,
            message_matched: false,
            matched_bank_digits: None,
            match_source: MatchSource::Automatic,
        }
    }

    /// Drop every trace of an automatic decision
    pub(crate) fn reset_automatic_state(&mut self) {
        if !self.status.is_open() {
            self.status = RegistrationStatus::Pending;
        }
        self.matched_id = None;
        self.reconciliation_note = None;
        self.message_matched = false;
        self.matched_bank_digits = None;
    }
}

/// One observed bank transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankEntry {
    /// Unique identifier
    pub id: String,
    /// Display date as given by the bank
    pub date: String,
    /// Display time as given by the bank
    pub time: String,
    pub summary: String,
    pub amount: BigDecimal,
    /// Passbook note
    pub note: String,
    /// Counterpart bank
    pub bank_info: String,
    /// Tail of the remitting account
    pub last_five_digits: String,
    /// Free-text remittance message; may name a player
    pub message: String,
    #[serde(default)]
    pub status: BankStatus,
    /// Linked registration id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
    #[serde(default)]
    pub message_matched: bool,
    #[serde(default)]
    pub match_source: MatchSource,
}

impl BankEntry {
    /// Create a new available bank entry with empty descriptive fields
    pub fn new(id: String, amount: BigDecimal, last_five_digits: String) -> Self {
        Self {
            id,
            date: String::new(),
            time: String::new(),
            summary: String::new(),
            amount,
            note: String::new(),
            bank_info: String::new(),
            last_five_digits,
            message: String::new(),
            status: BankStatus::Available,
            matched_id: None,
            message_matched: false,
            match_source: MatchSource::Automatic,
        }
    }

    /// Set the remittance message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the passbook note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Set the display date and time
    pub fn with_timestamp(mut self, date: impl Into<String>, time: impl Into<String>) -> Self {
        self.date = date.into();
        self.time = time.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == BankStatus::Available
    }

    pub(crate) fn reset_automatic_state(&mut self) {
        self.status = BankStatus::Available;
        self.matched_id = None;
        self.message_matched = false;
    }
}

/// Both collections, owned together by the caller
///
/// Deserializing recovers manual provenance through
/// [`EntrySet::restore_provenance`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredEntrySet")]
pub struct EntrySet {
    pub registrations: Vec<RegistrationEntry>,
    pub bank_entries: Vec<BankEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntrySet {
    #[serde(default)]
    registrations: Vec<RegistrationEntry>,
    #[serde(default)]
    bank_entries: Vec<BankEntry>,
}

impl From<StoredEntrySet> for EntrySet {
    fn from(stored: StoredEntrySet) -> Self {
        let mut set = EntrySet::new(stored.registrations, stored.bank_entries);
        set.restore_provenance();
        set
    }
}

impl EntrySet {
    pub fn new(registrations: Vec<RegistrationEntry>, bank_entries: Vec<BankEntry>) -> Self {
        Self {
            registrations,
            bank_entries,
        }
    }

    pub fn registration(&self, id: &str) -> Option<&RegistrationEntry> {
        self.registrations.iter().find(|r| r.id == id)
    }

    pub fn bank_entry(&self, id: &str) -> Option<&BankEntry> {
        self.bank_entries.iter().find(|b| b.id == id)
    }

    /// Sizes of both collections, used to detect imports and removals
    pub fn counts(&self) -> (usize, usize) {
        (self.registrations.len(), self.bank_entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty() && self.bank_entries.is_empty()
    }

    /// Mark entries as manual when they were stored without a
    /// `match_source` but carry the markers every manual decision writes.
    ///
    /// A synthetic bank entry is recognised by its summary. A matched
    /// registration is recognised by the start of its note, and a bound
    /// registration's bank entry follows it.
    pub fn restore_provenance(&mut self) {
        for bank in &mut self.bank_entries {
            if bank.match_source == MatchSource::Automatic
                && bank.summary == MANUAL_INJECTION_MARKER
            {
                bank.match_source = MatchSource::ManualInjection;
            }
        }

        for reg in &mut self.registrations {
            if reg.match_source.is_manual() || reg.status != RegistrationStatus::Matched {
                continue;
            }
            let note = reg.reconciliation_note.as_deref().unwrap_or("");
            if note.starts_with(MANUAL_INJECTION_MARKER) {
                reg.match_source = MatchSource::ManualInjection;
            } else if note.starts_with(MANUAL_BINDING_MARKER) {
                reg.match_source = MatchSource::ManualBinding;
                let Some(bank_id) = reg.matched_id.as_deref() else {
                    continue;
                };
                if let Some(bank) = self
                    .bank_entries
                    .iter_mut()
                    .find(|b| b.id == bank_id && !b.match_source.is_manual())
                {
                    bank.match_source = MatchSource::ManualBinding;
                }
            }
        }
    }
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
