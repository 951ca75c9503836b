use anyhow::Context;
use gc_crypto::WalletKey;
use gc_storage::Keystore;
use tracing::info;

use crate::error::ClaimError;

/// Local key store entry holding the visitor's private key.
pub const WALLET_KEY_NAME: &str = "gift_wallet_private_key";

#[derive(Debug)]
pub struct ProvisionedWallet {
    pub wallet: WalletKey,
    /// True when the key was generated during this call.
    pub created: bool,
}

/// Loads the visitor wallet from the key store, creating it on first use.
pub struct WalletProvisioner<'a, K: ?Sized> {
    keystore: &'a K,
    key_name: &'a str,
}

impl<'a, K> WalletProvisioner<'a, K>
where
    K: Keystore + ?Sized,
{
    pub fn new(keystore: &'a K) -> Self {
        Self {
            keystore,
            key_name: WALLET_KEY_NAME,
        }
    }

    pub fn with_key_name(keystore: &'a K, key_name: &'a str) -> Self {
        Self { keystore, key_name }
    }

    /// A stored key that fails to decode is reported, never replaced.
    pub async fn provision(&self) -> Result<ProvisionedWallet, ClaimError> {
        let stored = self
            .keystore
            .load_key(self.key_name)
            .await
            .map_err(ClaimError::Provision)?;

        if let Some(encoded) = stored {
            let wallet = WalletKey::from_private_key_hex(&encoded)
                .with_context(|| format!("stored key '{}' is unreadable", self.key_name))
                .map_err(ClaimError::Provision)?;
            return Ok(ProvisionedWallet {
                wallet,
                created: false,
            });
        }

        let wallet = WalletKey::new_random();
        self.keystore
            .save_key(self.key_name, &wallet.private_key_hex())
            .await
            .map_err(ClaimError::Provision)?;
        info!("created gift wallet {}", wallet.wallet_address());

        Ok(ProvisionedWallet {
            wallet,
            created: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingKeystore;

    #[tokio::test]
    async fn fresh_profile_generates_and_persists_one_key() -> anyhow::Result<()> {
        let keystore = CountingKeystore::default();
        let provisioned = WalletProvisioner::new(&keystore).provision().await?;

        assert!(provisioned.created);
        assert_eq!(keystore.writes(), 1);
        let stored = keystore
            .load_key(WALLET_KEY_NAME)
            .await?
            .expect("key should be stored");
        assert_eq!(
            WalletKey::from_private_key_hex(&stored)?.wallet_address(),
            provisioned.wallet.wallet_address()
        );
        Ok(())
    }

    #[tokio::test]
    async fn reprovisioning_reuses_the_stored_key() -> anyhow::Result<()> {
        let keystore = CountingKeystore::default();
        let first = WalletProvisioner::new(&keystore).provision().await?;
        let stored_before = keystore.load_key(WALLET_KEY_NAME).await?;

        for _ in 0..3 {
            let again = WalletProvisioner::new(&keystore).provision().await?;
            assert!(!again.created);
            assert_eq!(again.wallet.wallet_address(), first.wallet.wallet_address());
        }

        assert_eq!(keystore.writes(), 1);
        assert_eq!(keystore.load_key(WALLET_KEY_NAME).await?, stored_before);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_key_is_an_error_and_left_in_place() -> anyhow::Result<()> {
        let keystore = CountingKeystore::default();
        keystore.save_key(WALLET_KEY_NAME, "garbage").await?;

        let result = WalletProvisioner::new(&keystore).provision().await;
        assert!(matches!(result, Err(ClaimError::Provision(_))));
        assert_eq!(keystore.writes(), 1);
        assert_eq!(
            keystore.load_key(WALLET_KEY_NAME).await?.as_deref(),
            Some("garbage")
        );
        Ok(())
    }

    #[tokio::test]
    async fn custom_key_name_is_isolated() -> anyhow::Result<()> {
        let keystore = CountingKeystore::default();
        WalletProvisioner::with_key_name(&keystore, "other_page_key")
            .provision()
            .await?;
        assert!(keystore.load_key(WALLET_KEY_NAME).await?.is_none());
        assert!(keystore.load_key("other_page_key").await?.is_some());
        Ok(())
    }
}
