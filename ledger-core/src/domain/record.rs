//! Encrypted at-rest representation of an account

use serde::{Deserialize, Serialize};

use crate::domain::account::AccountType;

/// At-rest form of an account
///
/// Sensitive fields are envelope strings produced by the field cipher. The
/// lookup hashes are deterministic and stable across key rotation, which
/// keeps get-by-id working even though the field encryption itself is
/// non-deterministic. Account type and the active flag stay plaintext:
/// neither is sensitive, and the active flag gates every mutation check.
///
/// A record is only ever decrypted for the duration of the single operation
/// that needs it; decrypted snapshots are not cached anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Deterministic lookup key derived from the account id
    pub id_hash: String,
    /// Deterministic lookup key derived from the owner id
    pub owner_hash: String,
    pub cipher_id: String,
    pub cipher_owner: String,
    pub account_type: AccountType,
    pub cipher_balance: String,
    pub cipher_currency: String,
    pub active: bool,
}
