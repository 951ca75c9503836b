use anyhow::{Context, Result, anyhow};
use gc_api_types::WalletAddress;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};
use std::fmt;
use zeroize::Zeroizing;

/// Recoverable secp256k1 signature split into its transaction fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

pub trait Signer: Send + Sync {
    fn address(&self) -> WalletAddress;
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature>;
}

pub fn keccak256(input: &[u8]) -> [u8; 32] {
    Keccak256::digest(input).into()
}

/// A secp256k1 wallet key. The address is derived the Ethereum way.
pub struct WalletKey {
    signing_key: SigningKey,
}

impl WalletKey {
    pub fn new_random() -> Self {
        let mut rng = OsRng;
        Self {
            signing_key: SigningKey::random(&mut rng),
        }
    }

    pub fn from_secret_key_bytes(secret_key: &[u8]) -> Result<Self> {
        let signing_key = SigningKey::from_slice(secret_key)
            .map_err(|err| anyhow!("invalid secp256k1 secret key: {err}"))?;
        Ok(Self { signing_key })
    }

    /// Accepts the `0x`-prefixed hex encoding written by [`WalletKey::private_key_hex`].
    pub fn from_private_key_hex(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(hex::decode(digits).context("private key is not valid hex")?);
        if bytes.len() != 32 {
            return Err(anyhow!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            ));
        }
        Self::from_secret_key_bytes(&bytes)
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let mut raw = Zeroizing::new([0_u8; 32]);
        raw.copy_from_slice(&self.signing_key.to_bytes());
        Zeroizing::new(format!("0x{}", hex::encode(raw.as_slice())))
    }

    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut out = [0_u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    pub fn wallet_address(&self) -> WalletAddress {
        let public_key = self.public_key_uncompressed();
        let digest = keccak256(&public_key[1..]);
        let mut address = [0_u8; 20];
        address.copy_from_slice(&digest[12..]);
        WalletAddress(address)
    }
}

impl fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKey")
            .field("address", &self.wallet_address().to_string())
            .finish_non_exhaustive()
    }
}

impl Signer for WalletKey {
    fn address(&self) -> WalletAddress {
        self.wallet_address()
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|err| anyhow!("signing failed: {err}"))?;

        let bytes = signature.to_bytes();
        let mut r = [0_u8; 32];
        let mut s = [0_u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn address_of_known_key() -> Result<()> {
        let wallet = WalletKey::from_private_key_hex(KEY_ONE)?;
        assert_eq!(
            wallet.wallet_address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        Ok(())
    }

    #[test]
    fn private_key_hex_reloads_to_same_wallet() -> Result<()> {
        let wallet = WalletKey::new_random();
        let encoded = wallet.private_key_hex();
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), 66);

        let restored = WalletKey::from_private_key_hex(&encoded)?;
        assert_eq!(restored.wallet_address(), wallet.wallet_address());
        Ok(())
    }

    #[test]
    fn rejects_malformed_private_keys() {
        assert!(WalletKey::from_private_key_hex("0x1234").is_err());
        assert!(WalletKey::from_private_key_hex("not-hex").is_err());
        assert!(WalletKey::from_private_key_hex(&format!("0x{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn signature_recovers_signer() -> Result<()> {
        let wallet = WalletKey::new_random();
        let digest = keccak256(b"gift claim");
        let signature = wallet.sign_digest(&digest)?;

        let mut bytes = [0_u8; 64];
        bytes[..32].copy_from_slice(&signature.r);
        bytes[32..].copy_from_slice(&signature.s);
        let parsed = Signature::from_slice(&bytes)?;
        let recovery_id =
            RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| anyhow!("bad recovery id"))?;
        let recovered = VerifyingKey::recover_from_prehash(&digest, &parsed, recovery_id)?;

        assert_eq!(&recovered, wallet.signing_key.verifying_key());
        Ok(())
    }

    #[test]
    fn debug_output_hides_secret() {
        let wallet = WalletKey::new_random();
        let rendered = format!("{wallet:?}");
        assert!(rendered.contains("address"));
        assert!(!rendered.contains(wallet.private_key_hex().trim_start_matches("0x")));
    }
}
