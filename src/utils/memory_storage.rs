//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    registrations: Arc<RwLock<Vec<RegistrationEntry>>>,
    bank_entries: Arc<RwLock<Vec<BankEntry>>>,
}

fn read<T>(lock: &RwLock<T>) -> ReconcileResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| ReconcileError::Storage(format!("lock poisoned: {e}")))
}

fn write<T>(lock: &RwLock<T>) -> ReconcileResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| ReconcileError::Storage(format!("lock poisoned: {e}")))
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStorage for MemoryStorage {
    async fn registrations(&self) -> ReconcileResult<Vec<RegistrationEntry>> {
        Ok(read(&self.registrations)?.clone())
    }

    async fn bank_entries(&self) -> ReconcileResult<Vec<BankEntry>> {
        Ok(read(&self.bank_entries)?.clone())
    }

    async fn append_registrations(
        &mut self,
        registrations: Vec<RegistrationEntry>,
    ) -> ReconcileResult<()> {
        write(&self.registrations)?.extend(registrations);
        Ok(())
    }

    async fn append_bank_entries(&mut self, bank_entries: Vec<BankEntry>) -> ReconcileResult<()> {
        write(&self.bank_entries)?.extend(bank_entries);
        Ok(())
    }

    async fn replace_registrations(
        &mut self,
        registrations: Vec<RegistrationEntry>,
    ) -> ReconcileResult<()> {
        *write(&self.registrations)? = registrations;
        Ok(())
    }

    async fn replace_bank_entries(&mut self, bank_entries: Vec<BankEntry>) -> ReconcileResult<()> {
        *write(&self.bank_entries)? = bank_entries;
        Ok(())
    }

    async fn clear(&mut self) -> ReconcileResult<()> {
        write(&self.registrations)?.clear();
        write(&self.bank_entries)?.clear();
        Ok(())
    }
}
