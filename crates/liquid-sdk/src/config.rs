use std::fs;
use std::path::{Path, PathBuf};

use liquid_crypto::StoreKey;
use liquid_ledger::ChangeLogLimits;
use liquid_types::DEFAULT_AUTHOR;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LiquidError, LiquidResult};

/// Where the record encryption key comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// A fresh random key for this store instance only.
    #[default]
    Generate,
    /// 64 hex characters.
    Hex(String),
    /// Derived from a passphrase.
    Passphrase(String),
    /// A hex key file, created with a random key if missing.
    File(PathBuf),
}

impl KeySource {
    pub fn resolve(&self) -> LiquidResult<StoreKey> {
        Ok(match self {
            Self::Generate => StoreKey::generate(),
            Self::Hex(hex) => StoreKey::from_hex(hex)?,
            Self::Passphrase(phrase) => StoreKey::from_passphrase(phrase),
            Self::File(path) => StoreKey::load_or_generate(path)?,
        })
    }
}

/// Store configuration, loadable from TOML:
///
/// ```toml
/// data_dir = "/var/lib/liquid/objects"
/// default_author = "system"
/// key = { file = "/var/lib/liquid/store.key" }
///
/// [change_log]
/// max_entries = 10000
/// retain_entries = 5000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one record per object. `None` keeps records in memory.
    pub data_dir: Option<PathBuf>,
    /// Author recorded when a mutation does not name one.
    pub default_author: String,
    pub key: KeySource,
    pub change_log: ChangeLogLimits,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_author: DEFAULT_AUTHOR.to_string(),
            key: KeySource::Generate,
            change_log: ChangeLogLimits::default(),
        }
    }
}

impl StoreConfig {
    /// Memory-only configuration.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Directory-backed configuration with an ephemeral key.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: KeySource) -> Self {
        self.key = key;
        self
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    pub fn with_change_log(mut self, limits: ChangeLogLimits) -> Self {
        self.change_log = limits;
        self
    }

    pub fn from_toml_str(text: &str) -> LiquidResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| LiquidError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> LiquidResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| LiquidError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> LiquidResult<String> {
        toml::to_string(self).map_err(|e| LiquidError::Config(e.to_string()))
    }

    pub fn validate(&self) -> LiquidResult<()> {
        if self.default_author.trim().is_empty() {
            return Err(LiquidError::Config("default_author must not be empty".into()));
        }
        self.change_log.validate()?;
        if self.data_dir.is_some() && self.key == KeySource::Generate {
            warn!("directory store with a generated key: records will not be readable after restart");
        }
        Ok(())
    }
}
