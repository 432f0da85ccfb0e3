//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Encryption owns
//! the keyring and the field cipher, the store owns concurrent account
//! access, and the transfer coordinator ties balance movements to the
//! transaction log.

pub mod encryption;
mod store;
mod transfer;

pub use encryption::{FieldCipher, KeyEntry, KeyMaterial, KeyRing, KeyRotator};
pub use store::AccountStore;
pub use transfer::TransferCoordinator;
