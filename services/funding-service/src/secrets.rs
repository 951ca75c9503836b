//! Where the custodial sender key comes from.

use anyhow::{Context, Result, anyhow};
use gc_crypto::WalletKey;
use std::path::PathBuf;
use zeroize::Zeroizing;

pub(crate) const SENDER_KEY_ENV: &str = "GIFT_SENDER_PRIVATE_KEY";
pub(crate) const SENDER_KEY_FILE_ENV: &str = "GIFT_SENDER_KEY_FILE";

pub(crate) trait SecretProvider: Send + Sync {
    fn source(&self) -> String;
    fn sender_private_key(&self) -> Result<Zeroizing<String>>;

    fn sender_wallet(&self) -> Result<WalletKey> {
        let encoded = self.sender_private_key()?;
        WalletKey::from_private_key_hex(encoded.trim())
            .with_context(|| format!("invalid sender key from {}", self.source()))
    }
}

pub(crate) struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    pub(crate) fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SecretProvider for EnvSecretProvider {
    fn source(&self) -> String {
        format!("env:{}", self.var)
    }

    fn sender_private_key(&self) -> Result<Zeroizing<String>> {
        std::env::var(&self.var)
            .map(Zeroizing::new)
            .with_context(|| format!("{} is not set", self.var))
    }
}

/// Reads the key from a file, e.g. a mounted secret volume.
pub(crate) struct FileSecretProvider {
    path: PathBuf,
}

impl FileSecretProvider {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecretProvider for FileSecretProvider {
    fn source(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn sender_private_key(&self) -> Result<Zeroizing<String>> {
        std::fs::read_to_string(&self.path)
            .map(Zeroizing::new)
            .with_context(|| format!("failed to read sender key file {}", self.path.display()))
    }
}

/// The key file wins when both variables are set.
pub(crate) fn provider_from_env() -> Result<Box<dyn SecretProvider>> {
    if let Ok(path) = std::env::var(SENDER_KEY_FILE_ENV) {
        if !path.trim().is_empty() {
            return Ok(Box::new(FileSecretProvider::new(path.trim())));
        }
    }
    if std::env::var_os(SENDER_KEY_ENV).is_some() {
        return Ok(Box::new(EnvSecretProvider::new(SENDER_KEY_ENV)));
    }
    Err(anyhow!(
        "no sender key configured; set {SENDER_KEY_FILE_ENV} or {SENDER_KEY_ENV}"
    ))
}
