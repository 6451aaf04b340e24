//! Traits for storage abstraction and time injection

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::types::*;

/// Storage abstraction for the two entry collections
///
/// The reconciliation core never owns persistence. A caller plugs in any
/// backend (browser storage bridge, SQLite, in-memory, etc.) by implementing
/// these methods. Collections are ordered; every method must preserve the
/// order it was given.
#[async_trait]
pub trait EntryStorage: Send + Sync {
    /// Load all registrations in roster order
    async fn registrations(&self) -> ReconcileResult<Vec<RegistrationEntry>>;

    /// Load all bank entries in statement order
    async fn bank_entries(&self) -> ReconcileResult<Vec<BankEntry>>;

    /// Append newly imported registrations
    async fn append_registrations(
        &mut self,
        registrations: Vec<RegistrationEntry>,
    ) -> ReconcileResult<()>;

    /// Append newly imported or injected bank entries
    async fn append_bank_entries(&mut self, bank_entries: Vec<BankEntry>) -> ReconcileResult<()>;

    /// Replace every registration
    async fn replace_registrations(
        &mut self,
        registrations: Vec<RegistrationEntry>,
    ) -> ReconcileResult<()>;

    /// Replace every bank entry
    async fn replace_bank_entries(&mut self, bank_entries: Vec<BankEntry>) -> ReconcileResult<()>;

    /// Remove everything
    async fn clear(&mut self) -> ReconcileResult<()>;

    /// Load both collections together, recovering manual provenance for
    /// entries stored without it
    async fn load(&self) -> ReconcileResult<EntrySet> {
        let mut set = EntrySet::new(self.registrations().await?, self.bank_entries().await?);
        set.restore_provenance();
        Ok(set)
    }

    /// Replace both collections together
    async fn save(&mut self, set: EntrySet) -> ReconcileResult<()> {
        self.replace_registrations(set.registrations).await?;
        self.replace_bank_entries(set.bank_entries).await
    }
}

/// Source of the wall-clock time stamped on synthetic bank entries
pub trait Clock: Send + Sync {
    /// Current local calendar date and time
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the machine's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Clock that always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
