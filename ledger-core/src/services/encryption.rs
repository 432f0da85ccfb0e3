//! Encryption service - rotating keyring and field cipher
//!
//! Sensitive fields are encrypted with AES-256-GCM. Every envelope embeds
//! the id of the key generation that produced it, so ciphertexts written
//! before a rotation stay readable for as long as that generation is
//! retained. Key ids have a fixed width inside the envelope, which keeps
//! parsing unambiguous without a delimiter byte.

use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::domain::result::{Error, Result};

/// Default Argon2id parameters for passphrase-derived key material
const DEFAULT_TIME_COST: u32 = 3;
const DEFAULT_MEMORY_COST: u32 = 65536; // 64 MiB
const DEFAULT_PARALLELISM: u32 = 4;

/// Width of a key id inside an envelope, in bytes (8 random bytes as hex)
const KEY_ID_LEN: usize = 16;
/// AES-GCM nonce width
const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag width
const TAG_LEN: usize = 16;
/// Domain separator mixed into the lookup-hash key
const INDEX_KEY_LABEL: &[u8] = b"ledger-core/index-key/v1";

/// 32 bytes of symmetric key material
///
/// Where the bytes come from (environment, file, external key management)
/// is the caller's concern; the keyring only needs the bytes.
#[derive(Clone)]
pub struct KeyMaterial([u8; 32]);

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate fresh random material
    pub fn generate() -> Self {
        Self(rand::thread_rng().gen())
    }

    /// Derive material from a passphrase using Argon2id
    pub fn derive_from_passphrase(passphrase: &str, salt: &[u8]) -> Result<Self> {
        let params = argon2::Params::new(
            DEFAULT_MEMORY_COST,
            DEFAULT_TIME_COST,
            DEFAULT_PARALLELISM,
            Some(32),
        )
        .map_err(|e| Error::Encryption(format!("invalid argon2 params: {e:?}")))?;

        let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut out = [0u8; 32];
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut out)
            .map_err(|e| Error::Encryption(format!("key derivation failed: {e:?}")))?;
        Ok(Self(out))
    }

    fn bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key bytes
        write!(f, "KeyMaterial(..)")
    }
}

/// A single key generation. Immutable once created.
#[derive(Clone)]
pub struct KeyEntry {
    pub key_id: String,
    material: KeyMaterial,
    pub created_at: DateTime<Utc>,
}

impl KeyEntry {
    fn new(material: KeyMaterial) -> Self {
        let id_bytes: [u8; 8] = rand::thread_rng().gen();
        Self {
            key_id: hex::encode(id_bytes),
            material,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEntry")
            .field("key_id", &self.key_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

struct KeyRingState {
    keys: HashMap<String, KeyEntry>,
    /// Rotation order, oldest first; the last entry is the current generation
    order: Vec<String>,
}

/// Rotating registry of symmetric keys
///
/// Rotation installs a new generation and repoints "current" under a single
/// write lock, so readers never observe a half-updated state. Superseded
/// generations are retained so old ciphertexts stay decryptable, unless a
/// retention limit purges them.
pub struct KeyRing {
    state: RwLock<KeyRingState>,
    /// Derived once from the initial material and never rotated: lookup
    /// hashes must stay stable across generations.
    index_key: [u8; 32],
    /// Retain only the newest N generations; `None` retains everything
    retention: Option<usize>,
}

impl KeyRing {
    /// Create a keyring with its initial generation, retaining all
    /// superseded generations
    pub fn new(material: KeyMaterial) -> Self {
        Self::with_retention(material, None)
    }

    /// Create a keyring that keeps only the newest `retention` generations
    pub fn with_retention(material: KeyMaterial, retention: Option<usize>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(INDEX_KEY_LABEL);
        hasher.update(material.bytes());
        let digest = hasher.finalize();
        let mut index_key = [0u8; 32];
        index_key.copy_from_slice(&digest);

        let entry = KeyEntry::new(material);
        let order = vec![entry.key_id.clone()];
        let mut keys = HashMap::new();
        keys.insert(entry.key_id.clone(), entry);

        Self {
            state: RwLock::new(KeyRingState { keys, order }),
            index_key,
            retention,
        }
    }

    /// Install a new generation and repoint "current" in one atomic swap.
    /// Returns the new key id.
    pub fn rotate(&self, material: KeyMaterial) -> String {
        // Entry construction happens before the write lock is taken, so
        // readers are only blocked for the pointer swap itself.
        let entry = KeyEntry::new(material);
        let key_id = entry.key_id.clone();

        let mut state = self.state.write().expect("keyring lock poisoned");
        state.order.push(key_id.clone());
        state.keys.insert(key_id.clone(), entry);

        if let Some(retain) = self.retention {
            // The current generation is never purged
            let retain = retain.max(1);
            while state.order.len() > retain {
                let purged = state.order.remove(0);
                state.keys.remove(&purged);
                info!(key_id = %purged, "purged retired encryption key");
            }
        }
        drop(state);

        info!(key_id = %key_id, "rotated encryption key");
        key_id
    }

    /// The generation new envelopes are sealed under
    pub fn current_key(&self) -> KeyEntry {
        let state = self.state.read().expect("keyring lock poisoned");
        let current = state.order.last().expect("keyring is never empty");
        state.keys[current].clone()
    }

    /// Resolve a generation by id, failing with `KeyNotFound` for ids that
    /// were never issued or have been purged
    pub fn key_by_id(&self, key_id: &str) -> Result<KeyEntry> {
        let state = self.state.read().expect("keyring lock poisoned");
        state
            .keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(key_id.to_string()))
    }

    /// Number of generations currently held
    pub fn generations(&self) -> usize {
        self.state.read().expect("keyring lock poisoned").order.len()
    }

    fn index_key(&self) -> &[u8; 32] {
        &self.index_key
    }
}

/// Encrypt/decrypt primitive over the keyring
///
/// Stateless: every call reads the keyring's current snapshot, so the
/// cipher can be shared freely across threads.
pub struct FieldCipher {
    keyring: Arc<KeyRing>,
}

impl FieldCipher {
    pub fn new(keyring: Arc<KeyRing>) -> Self {
        Self { keyring }
    }

    /// Encrypt a field under the current key
    ///
    /// Empty input passes through unchanged so absent values stay absent.
    /// The envelope is base64 of: key id (16 bytes) | nonce (12 bytes) |
    /// ciphertext and tag.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let key = self.keyring.current_key();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.material.bytes()));
        let nonce_bytes: [u8; NONCE_LEN] = rand::thread_rng().gen();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| Error::Encryption("AES-GCM encryption failed".to_string()))?;

        let mut envelope = Vec::with_capacity(KEY_ID_LEN + NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(key.key_id.as_bytes());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(envelope))
    }

    /// Decrypt an envelope, resolving the key generation it names
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        if envelope.is_empty() {
            return Ok(String::new());
        }

        let bytes = BASE64
            .decode(envelope)
            .map_err(|e| Error::Decryption(format!("invalid envelope encoding: {e}")))?;
        if bytes.len() < KEY_ID_LEN + NONCE_LEN + TAG_LEN {
            return Err(Error::Decryption("envelope too short".to_string()));
        }

        let key_id = std::str::from_utf8(&bytes[..KEY_ID_LEN])
            .map_err(|_| Error::Decryption("invalid key id in envelope".to_string()))?;
        let key = self.keyring.key_by_id(key_id)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.material.bytes()));
        let nonce = Nonce::from_slice(&bytes[KEY_ID_LEN..KEY_ID_LEN + NONCE_LEN]);
        let plaintext = cipher
            .decrypt(nonce, &bytes[KEY_ID_LEN + NONCE_LEN..])
            .map_err(|_| Error::Decryption("ciphertext integrity check failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Decryption("decrypted field is not valid UTF-8".to_string()))
    }

    /// Deterministic lookup hash for an identifier
    ///
    /// Keyed with the keyring's index key, which never rotates: the same
    /// plaintext maps to the same hash for the lifetime of the ledger, so
    /// records stay findable after any number of rotations.
    pub fn lookup_hash(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.keyring.index_key());
        hasher.update(value.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Background rotation on a fixed interval
///
/// Fresh material is generated outside the keyring lock. Dropping the
/// handle stops the worker and joins it.
pub struct KeyRotator {
    stop: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl KeyRotator {
    pub fn spawn(keyring: Arc<KeyRing>, interval: Duration) -> Self {
        let (stop, ticker) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || loop {
            match ticker.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    keyring.rotate(KeyMaterial::generate());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        debug!(interval_secs = interval.as_secs(), "key rotation worker started");
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for KeyRotator {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
