//! Account store - concurrent encrypted account storage

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountType, EncryptedRecord, Money};
use crate::ports::Repository;
use crate::services::encryption::FieldCipher;

/// Concurrent keyed collection of encrypted accounts
///
/// The store owns the canonical copy of every account; callers only ever
/// receive snapshots. All state changes funnel through `mutate`, which
/// holds that account's lock for the duration of the change. Records are
/// decrypted only for the single operation that needs them and re-sealed
/// immediately after.
pub struct AccountStore {
    repository: Arc<dyn Repository>,
    cipher: Arc<FieldCipher>,
    /// One lock per account id hash; entries live as long as the store
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountStore {
    pub fn new(repository: Arc<dyn Repository>, cipher: Arc<FieldCipher>) -> Self {
        Self {
            repository,
            cipher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create and persist a new account, returning its first snapshot
    pub fn create(
        &self,
        owner_id: &str,
        account_type: AccountType,
        initial_balance: Money,
    ) -> Result<Account> {
        let account = Account::new(owner_id, account_type, initial_balance)?;
        let record = self.seal(&account)?;
        self.repository.save(record)?;
        debug!(account_id = %account.id, account_type = %account_type, "created account");
        Ok(account)
    }

    /// Fetch a snapshot by account id
    pub fn get(&self, id: Uuid) -> Result<Account> {
        let id_hash = self.cipher.lookup_hash(&id.to_string());
        let record = self
            .repository
            .find_by_id(&id_hash)?
            .ok_or_else(|| Error::not_found(format!("account {id}")))?;
        self.open(&record)
    }

    /// Snapshots of every account belonging to an owner, order unspecified
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Account>> {
        let owner_hash = self.cipher.lookup_hash(owner_id);
        self.repository
            .find_by_owner(&owner_hash)?
            .iter()
            .map(|record| self.open(record))
            .collect()
    }

    /// Snapshots of every account in the store
    pub fn list_all(&self) -> Result<Vec<Account>> {
        self.repository
            .find_all()?
            .iter()
            .map(|record| self.open(record))
            .collect()
    }

    /// Apply a state transition to one account under its exclusive lock
    ///
    /// This is the only path that changes a balance or the active flag.
    /// The transition's error propagates untouched and nothing is persisted
    /// on failure; on success the new snapshot is returned.
    pub fn mutate<F>(&self, id: Uuid, transition: F) -> Result<Account>
    where
        F: FnOnce(&mut Account) -> Result<()>,
    {
        let id_hash = self.cipher.lookup_hash(&id.to_string());
        let lock = self.lock_for(&id_hash);
        let _guard = lock.lock().expect("account lock poisoned");

        let record = self
            .repository
            .find_by_id(&id_hash)?
            .ok_or_else(|| Error::not_found(format!("account {id}")))?;
        let mut account = self.open(&record)?;
        transition(&mut account)?;

        let sealed = self.seal(&account)?;
        self.repository.save(sealed)?;
        Ok(account)
    }

    /// Mark an account inactive. Idempotent.
    pub fn deactivate(&self, id: Uuid) -> Result<Account> {
        self.mutate(id, |account| {
            account.deactivate();
            Ok(())
        })
    }

    /// Reactivate an account. Idempotent.
    pub fn activate(&self, id: Uuid) -> Result<Account> {
        self.mutate(id, |account| {
            account.activate();
            Ok(())
        })
    }

    fn lock_for(&self, id_hash: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        locks
            .entry(id_hash.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Encrypt an account into its at-rest record
    fn seal(&self, account: &Account) -> Result<EncryptedRecord> {
        let id = account.id.to_string();
        Ok(EncryptedRecord {
            id_hash: self.cipher.lookup_hash(&id),
            owner_hash: self.cipher.lookup_hash(&account.owner_id),
            cipher_id: self.cipher.encrypt(&id)?,
            cipher_owner: self.cipher.encrypt(&account.owner_id)?,
            account_type: account.account_type,
            cipher_balance: self.cipher.encrypt(&account.balance.amount.to_string())?,
            cipher_currency: self.cipher.encrypt(&account.balance.currency)?,
            active: account.active,
        })
    }

    /// Decrypt a record back into an account snapshot
    fn open(&self, record: &EncryptedRecord) -> Result<Account> {
        let id = self.cipher.decrypt(&record.cipher_id)?;
        let id = Uuid::parse_str(&id)
            .map_err(|_| Error::Decryption("stored account id is not a valid uuid".to_string()))?;
        let owner_id = self.cipher.decrypt(&record.cipher_owner)?;
        let amount = Decimal::from_str(&self.cipher.decrypt(&record.cipher_balance)?)
            .map_err(|_| Error::Decryption("stored balance is not a valid decimal".to_string()))?;
        let currency = self.cipher.decrypt(&record.cipher_currency)?;

        Ok(Account::from_parts(
            id,
            owner_id,
            record.account_type,
            Money::new(amount, &currency),
            record.active,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRepository;
    use crate::services::encryption::{KeyMaterial, KeyRing};

    fn usd(cents: i64) -> Money {
        Money::new(Decimal::new(cents, 2), "USD")
    }

    fn store() -> (Arc<InMemoryRepository>, AccountStore) {
        let keyring = Arc::new(KeyRing::new(KeyMaterial::generate()));
        let cipher = Arc::new(FieldCipher::new(keyring));
        let repository = Arc::new(InMemoryRepository::new());
        let store = AccountStore::new(Arc::clone(&repository) as Arc<dyn Repository>, cipher);
        (repository, store)
    }

    #[test]
    fn test_create_and_get() {
        let (_, store) = store();
        let created = store
            .create("CUST001", AccountType::Savings, usd(10000))
            .unwrap();
        let fetched = store.get(created.id).unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.owner_id, "CUST001");
        assert_eq!(fetched.balance, usd(10000));
        assert!(fetched.active);
    }

    #[test]
    fn test_get_missing_account() {
        let (_, store) = store();
        let err = store.get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_create_validates_input() {
        let (_, store) = store();
        assert!(matches!(
            store.create("", AccountType::Savings, usd(100)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.create("CUST001", AccountType::Savings, usd(-100)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_list_by_owner() {
        let (_, store) = store();
        store
            .create("CUST001", AccountType::Savings, usd(100))
            .unwrap();
        store
            .create("CUST001", AccountType::Checking, usd(200))
            .unwrap();
        store
            .create("CUST002", AccountType::Savings, usd(300))
            .unwrap();

        assert_eq!(store.list_by_owner("CUST001").unwrap().len(), 2);
        assert_eq!(store.list_by_owner("CUST002").unwrap().len(), 1);
        assert!(store.list_by_owner("CUST003").unwrap().is_empty());
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_mutate_persists_on_success() {
        let (_, store) = store();
        let account = store
            .create("CUST001", AccountType::Checking, usd(10000))
            .unwrap();

        let snapshot = store
            .mutate(account.id, |acc| acc.deposit(&usd(5000)))
            .unwrap();
        assert_eq!(snapshot.balance, usd(15000));
        assert_eq!(store.get(account.id).unwrap().balance, usd(15000));
    }

    #[test]
    fn test_mutate_failure_changes_nothing() {
        let (_, store) = store();
        let account = store
            .create("CUST001", AccountType::Checking, usd(10000))
            .unwrap();

        let err = store
            .mutate(account.id, |acc| acc.withdraw(&usd(99999)))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
        assert_eq!(store.get(account.id).unwrap().balance, usd(10000));
    }

    #[test]
    fn test_deactivate_blocks_mutation() {
        let (_, store) = store();
        let account = store
            .create("CUST001", AccountType::Checking, usd(10000))
            .unwrap();

        let snapshot = store.deactivate(account.id).unwrap();
        assert!(!snapshot.active);

        let err = store
            .mutate(account.id, |acc| acc.deposit(&usd(100)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAccount(_)));

        store.activate(account.id).unwrap();
        store
            .mutate(account.id, |acc| acc.deposit(&usd(100)))
            .unwrap();
        assert_eq!(store.get(account.id).unwrap().balance, usd(10100));
    }

    #[test]
    fn test_snapshots_are_detached() {
        let (_, store) = store();
        let mut snapshot = store
            .create("CUST001", AccountType::Checking, usd(10000))
            .unwrap();
        // Mutating a snapshot must not affect the stored account
        snapshot.deposit(&usd(99999)).unwrap();
        assert_eq!(store.get(snapshot.id).unwrap().balance, usd(10000));
    }

    #[test]
    fn test_records_hold_no_plaintext() {
        let (repository, store) = store();
        let account = store
            .create("CUST001", AccountType::Savings, usd(12345))
            .unwrap();

        let records = repository.find_all().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let id = account.id.to_string();
        for field in [
            &record.id_hash,
            &record.owner_hash,
            &record.cipher_id,
            &record.cipher_owner,
            &record.cipher_balance,
            &record.cipher_currency,
        ] {
            assert!(!field.contains(&id));
            assert!(!field.contains("CUST001"));
            assert!(!field.contains("123.45"));
        }
    }
}
