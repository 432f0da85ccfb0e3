//! Ledger Core - in-process encrypted account ledger
//!
//! This crate implements the ledger core following hexagonal architecture:
//!
//! - **domain**: Core business entities (Money, Account, Transaction, etc.)
//! - **ports**: Trait definitions for storage (Repository, TransactionLog)
//! - **services**: Encryption, the account store and transfer orchestration
//! - **adapters**: In-memory implementations of the ports
//!
//! Sensitive account fields never sit in memory as plaintext: the store
//! holds envelope-encrypted records and decrypts only for the duration of a
//! single operation. The keyring rotates without invalidating previously
//! written ciphertexts.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use adapters::memory::{InMemoryRepository, InMemoryTransactionLog};
use config::LedgerConfig;
use services::encryption::{FieldCipher, KeyMaterial, KeyRing, KeyRotator};
use services::{AccountStore, TransferCoordinator};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{Account, AccountType, EncryptedRecord, Money, Transaction, TransactionType};

/// Main context for ledger operations
///
/// This is the primary entry point. It wires the keyring, the encrypted
/// account store and the transfer coordinator together. Key material is
/// injected by the caller; where it comes from (environment variable, file,
/// external key management) is not this crate's concern.
pub struct Ledger {
    pub config: LedgerConfig,
    pub keyring: Arc<KeyRing>,
    pub accounts: Arc<AccountStore>,
    pub transfers: TransferCoordinator,
    /// Lives as long as the context; dropping it stops the rotation worker
    _rotator: Option<KeyRotator>,
}

impl Ledger {
    /// Create a ledger with default configuration
    pub fn new(material: KeyMaterial) -> Self {
        Self::with_config(material, LedgerConfig::default())
    }

    /// Create a ledger with explicit configuration
    pub fn with_config(material: KeyMaterial, config: LedgerConfig) -> Self {
        let keyring = Arc::new(KeyRing::with_retention(material, config.key_retention));
        let cipher = Arc::new(FieldCipher::new(Arc::clone(&keyring)));
        let repository = Arc::new(InMemoryRepository::new());
        let log = Arc::new(InMemoryTransactionLog::new());

        let accounts = Arc::new(AccountStore::new(repository, cipher));
        let transfers = TransferCoordinator::new(Arc::clone(&accounts), log);

        let rotator = config
            .rotation_interval_secs
            .map(|secs| KeyRotator::spawn(Arc::clone(&keyring), Duration::from_secs(secs)));

        Self {
            config,
            keyring,
            accounts,
            transfers,
            _rotator: rotator,
        }
    }
}
