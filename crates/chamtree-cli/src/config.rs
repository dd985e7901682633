//! Operator configuration: chameleon key material and block-size policy,
//! persisted as TOML under `~/.chamtree/`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use chamtree_core::{PublicKey, SecretKey, DEFAULT_BLOCK_SIZE};

/// Top-level config structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

/// Chameleon key material, hex encoded. Written by `chamtree keygen`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Secret scalar
    #[serde(default)]
    pub secret: Option<String>,
    /// Public key, pubX ‖ pubY
    #[serde(default)]
    pub public: Option<String>,
}

/// Tree build policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
        }
    }
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Config {
    /// Read the config file. A missing file is not an error: the default
    /// config is written out and returned, so first use seeds the file
    /// that `keygen` later fills in.
    pub fn load() -> Result<Self> {
        let path = config_path();
        match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text)
                .with_context(|| format!("invalid config at {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save()?;
                Ok(config)
            }
            Err(err) => {
                Err(err).with_context(|| format!("could not read {}", path.display()))
            }
        }
    }

    /// Write the config, creating its directory on first use.
    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("could not create {}", dir.display()))?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)
            .with_context(|| format!("could not write {}", path.display()))
    }

    /// Decode the stored secret key
    pub fn secret_key(&self) -> Result<SecretKey> {
        let hex_str = self
            .keys
            .secret
            .as_ref()
            .context("no secret key in config; run `chamtree keygen` first")?;
        let bytes = hex::decode(hex_str).context("secret key is not valid hex")?;
        SecretKey::from_bytes(&bytes).context("secret key is out of range")
    }

    /// Decode the stored public key
    pub fn public_key(&self) -> Result<PublicKey> {
        let hex_str = self
            .keys
            .public
            .as_ref()
            .context("no public key in config; run `chamtree keygen` first")?;
        let bytes = hex::decode(hex_str).context("public key is not valid hex")?;
        PublicKey::from_bytes(&bytes).context("public key must be 64 bytes")
    }
}

/// Directory holding the config: `$CHAMTREE_CONFIG_DIR` when set,
/// `~/.chamtree` otherwise (the current directory stands in when no home
/// directory can be determined).
pub fn config_dir() -> PathBuf {
    std::env::var_os("CHAMTREE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".chamtree")
        })
}

/// Path of the config file inside [`config_dir`].
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}
