//! Session orchestrator that ties import, automatic matching and manual
//! overrides to a storage backend

use tracing::{debug, info};

use crate::import::{self, ImportConfig, ImportProgress};
use crate::reconciliation::{overrides, ReconciliationSummary};
use crate::traits::*;
use crate::types::*;

/// Reconciliation session over caller-provided storage
///
/// Every mutating operation loads the current entries, applies a pure
/// transformation and saves the result. Automatic matching re-runs whenever
/// either collection changes size; content-only changes need an explicit
/// [`Session::reconcile`].
pub struct Session<S: EntryStorage, C: Clock = LocalClock> {
    storage: S,
    clock: C,
    config: ImportConfig,
    last_counts: Option<(usize, usize)>,
}

impl<S: EntryStorage> Session<S, LocalClock> {
    /// Create a new session with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, LocalClock)
    }
}

impl<S: EntryStorage, C: Clock> Session<S, C> {
    /// Create a new session with a custom clock
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            config: ImportConfig::default(),
            last_counts: None,
        }
    }

    /// Replace the import settings
    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn registrations(&self) -> ReconcileResult<Vec<RegistrationEntry>> {
        self.storage.registrations().await
    }

    pub async fn bank_entries(&self) -> ReconcileResult<Vec<BankEntry>> {
        self.storage.bank_entries().await
    }

    /// Totals and counts over the current entries
    pub async fn summary(&self) -> ReconcileResult<ReconciliationSummary> {
        Ok(ReconciliationSummary::from_set(&self.storage.load().await?))
    }

    /// Parse and append a pasted registration roster, then refresh.
    /// Returns how many registrations were added.
    pub async fn import_registrations(&mut self, text: &str) -> ReconcileResult<usize> {
        let registrations = import::parse_registrations(text, &self.config)?;
        let added = registrations.len();
        self.storage.append_registrations(registrations).await?;
        info!(added, "Imported registrations");

        self.refresh().await?;
        Ok(added)
    }

    /// Parse and append a pasted bank statement in chunks, then refresh.
    ///
    /// `on_progress` is called after every chunk and the task yields to the
    /// runtime between chunks. Returns how many bank entries were added.
    pub async fn import_bank_entries<F>(
        &mut self,
        text: &str,
        mut on_progress: F,
    ) -> ReconcileResult<usize>
    where
        F: FnMut(ImportProgress) + Send,
    {
        let rows = import::read_rows(text)?;
        let total = rows.len();
        let chunk_size = self.config.chunk_size.max(1);

        let mut entries = Vec::with_capacity(total);
        for chunk in rows.chunks(chunk_size) {
            entries.extend(chunk.iter().map(import::bank_entry_from_record));
            on_progress(ImportProgress {
                processed: entries.len(),
                total,
            });
            tokio::task::yield_now().await;
        }

        let added = entries.len();
        self.storage.append_bank_entries(entries).await?;
        info!(added, chunk_size, "Imported bank entries");

        self.refresh().await?;
        Ok(added)
    }

    /// Re-run automatic matching if either collection changed size since the
    /// last evaluation. Returns whether anything was saved.
    pub async fn refresh(&mut self) -> ReconcileResult<bool> {
        let set = self.storage.load().await?;
        let counts = set.counts();
        if self.last_counts == Some(counts) {
            debug!(?counts, "Entry counts unchanged, skipping reconciliation");
            return Ok(false);
        }
        self.last_counts = Some(counts);
        self.apply_reconciliation(set).await
    }

    /// Re-run automatic matching unconditionally. Returns whether anything
    /// was saved.
    pub async fn reconcile(&mut self) -> ReconcileResult<bool> {
        let set = self.storage.load().await?;
        self.last_counts = Some(set.counts());
        self.apply_reconciliation(set).await
    }

    async fn apply_reconciliation(&mut self, set: EntrySet) -> ReconcileResult<bool> {
        if set.registrations.is_empty() || set.bank_entries.is_empty() {
            return Ok(false);
        }
        match overrides::reconcile_preserving_manual(&set) {
            Some(updated) => {
                self.storage.save(updated).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Record a payment received outside the bank feed. See
    /// [`overrides::inject_payment`].
    pub async fn inject_payment(
        &mut self,
        registration_id: &str,
        reason: &str,
    ) -> ReconcileResult<Option<BankEntry>> {
        let mut set = self.storage.load().await?;
        let created = overrides::inject_payment(&mut set, registration_id, reason, &self.clock);
        if created.is_some() {
            self.storage.save(set).await?;
            self.refresh().await?;
        }
        Ok(created)
    }

    /// Remove a manual payment. See [`overrides::undo_injection`].
    pub async fn undo_injection(&mut self, registration_id: &str) -> ReconcileResult<bool> {
        let mut set = self.storage.load().await?;
        if !overrides::undo_injection(&mut set, registration_id) {
            return Ok(false);
        }
        self.storage.save(set).await?;
        self.refresh().await?;
        Ok(true)
    }

    /// Pair a bank entry with a registration. See [`overrides::bind`].
    ///
    /// Binding changes no collection size, so matching is re-run explicitly
    /// to release whatever the pair previously held up.
    pub async fn bind(&mut self, bank_id: &str, registration_id: &str) -> ReconcileResult<bool> {
        let mut set = self.storage.load().await?;
        if !overrides::bind(&mut set, bank_id, registration_id) {
            return Ok(false);
        }
        self.storage.save(set).await?;
        self.reconcile().await?;
        Ok(true)
    }

    /// Remove every entry
    pub async fn clear_all(&mut self) -> ReconcileResult<()> {
        self.storage.clear().await?;
        self.last_counts = None;
        info!("Cleared all entries");
        Ok(())
    }
}
