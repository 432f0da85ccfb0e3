//! Configuration management
//!
//! Optional `ledger.json` settings file:
//! ```json
//! {
//!   "keyRetention": 4,
//!   "rotationIntervalSecs": 3600
//! }
//! ```

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Keep only the newest N key generations after a rotation. `None`
    /// retains every generation, so historical ciphertexts always stay
    /// decryptable.
    #[serde(default)]
    pub key_retention: Option<usize>,
    /// Rotate the keyring automatically every N seconds. `None` leaves
    /// rotation entirely manual.
    #[serde(default)]
    pub rotation_interval_secs: Option<u64>,
}

impl LedgerConfig {
    /// Load config from a directory
    ///
    /// A missing or unreadable file yields the defaults. Overrides via
    /// environment: `LEDGER_KEY_RETENTION` and
    /// `LEDGER_ROTATION_INTERVAL_SECS` (for CI/testing).
    pub fn load(dir: &Path) -> Result<Self> {
        let settings_path = dir.join("ledger.json");

        let mut config: LedgerConfig = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            LedgerConfig::default()
        };

        if let Ok(value) = std::env::var("LEDGER_KEY_RETENTION") {
            if let Ok(n) = value.parse() {
                config.key_retention = Some(n);
            }
        }
        if let Ok(value) = std::env::var("LEDGER_ROTATION_INTERVAL_SECS") {
            if let Ok(n) = value.parse() {
                config.rotation_interval_secs = Some(n);
            }
        }

        Ok(config)
    }

    /// Save config to a directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join("ledger.json"), content)?;
        Ok(())
    }
}
