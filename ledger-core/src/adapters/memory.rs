//! In-memory port implementations

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{EncryptedRecord, Transaction};
use crate::ports::{Repository, TransactionLog};

/// In-memory account record store keyed by id hash
#[derive(Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<String, EncryptedRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for InMemoryRepository {
    fn save(&self, record: EncryptedRecord) -> Result<()> {
        let mut records = self.records.write().expect("record map poisoned");
        records.insert(record.id_hash.clone(), record);
        Ok(())
    }

    fn find_by_id(&self, id_hash: &str) -> Result<Option<EncryptedRecord>> {
        let records = self.records.read().expect("record map poisoned");
        Ok(records.get(id_hash).cloned())
    }

    fn find_by_owner(&self, owner_hash: &str) -> Result<Vec<EncryptedRecord>> {
        let records = self.records.read().expect("record map poisoned");
        Ok(records
            .values()
            .filter(|r| r.owner_hash == owner_hash)
            .cloned()
            .collect())
    }

    fn find_all(&self) -> Result<Vec<EncryptedRecord>> {
        let records = self.records.read().expect("record map poisoned");
        Ok(records.values().cloned().collect())
    }
}

/// In-memory append-only transaction log
#[derive(Default)]
pub struct InMemoryTransactionLog {
    entries: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, transaction: Transaction) -> Result<()> {
        let mut entries = self.entries.write().expect("transaction log poisoned");
        entries.push(transaction);
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let entries = self.entries.read().expect("transaction log poisoned");
        Ok(entries.iter().find(|t| t.id == id).cloned())
    }

    fn find_by_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let entries = self.entries.read().expect("transaction log poisoned");
        Ok(entries
            .iter()
            .filter(|t| t.involves(account_id))
            .cloned()
            .collect())
    }

    fn find_all(&self) -> Result<Vec<Transaction>> {
        let entries = self.entries.read().expect("transaction log poisoned");
        Ok(entries.clone())
    }
}
