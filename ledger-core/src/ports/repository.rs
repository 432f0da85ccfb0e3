//! Repository ports - storage abstraction

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{EncryptedRecord, Transaction};

/// Storage abstraction for encrypted account records
///
/// The core depends only on this narrow contract. The bundled adapter is
/// in-memory; a durable backend can be swapped in behind the same trait
/// without touching the store or the coordinator.
pub trait Repository: Send + Sync {
    /// Insert or replace the record stored under its id hash
    fn save(&self, record: EncryptedRecord) -> Result<()>;

    /// Fetch a record by its id hash
    fn find_by_id(&self, id_hash: &str) -> Result<Option<EncryptedRecord>>;

    /// Fetch all records belonging to an owner hash
    fn find_by_owner(&self, owner_hash: &str) -> Result<Vec<EncryptedRecord>>;

    /// Fetch every record
    fn find_all(&self) -> Result<Vec<EncryptedRecord>>;
}

/// Append-only store for completed ledger events
pub trait TransactionLog: Send + Sync {
    /// Append a completed transaction
    fn append(&self, transaction: Transaction) -> Result<()>;

    /// Fetch a transaction by id
    fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Transactions where the account appears on either side of the event
    fn find_by_account(&self, account_id: Uuid) -> Result<Vec<Transaction>>;

    /// Every recorded transaction, in append order
    fn find_all(&self) -> Result<Vec<Transaction>>;
}
