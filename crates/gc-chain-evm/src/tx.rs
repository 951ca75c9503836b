//! Legacy (type 0) transactions with EIP-155 replay protection.
//! See <https://eips.ethereum.org/EIPS/eip-155>.

use anyhow::Result;
use gc_api_types::WalletAddress;
use gc_crypto::{Signer, keccak256};
use rlp::RlpStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: WalletAddress,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn append_body(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        s.append(&self.to.as_bytes().to_vec());
        s.append(&self.value);
        s.append(&self.data);
    }

    /// Bytes hashed for signing: the body followed by `chain_id, 0, 0`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&self.chain_id);
        s.append(&0u8);
        s.append(&0u8);
        s.out().to_vec()
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// Signs the transaction and returns the raw bytes for `eth_sendRawTransaction`.
    pub fn sign(&self, signer: &dyn Signer) -> Result<Vec<u8>> {
        let signature = signer.sign_digest(&self.signing_hash())?;
        let v = self.chain_id * 2 + 35 + u64::from(signature.recovery_id);

        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&v);
        s.append(&trim_leading_zeros(&signature.r));
        s.append(&trim_leading_zeros(&signature.s));
        Ok(s.out().to_vec())
    }
}

// RLP scalars carry no leading zero bytes.
fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_crypto::WalletKey;

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: WalletAddress([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn signing_payload_matches_eip155_example() {
        let tx = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn signed_transaction_carries_eip155_v() -> Result<()> {
        let signer = WalletKey::from_private_key_hex(&format!("0x{}", "46".repeat(32)))?;
        let raw = eip155_example().sign(&signer)?;

        let rlp = rlp::Rlp::new(&raw);
        assert_eq!(rlp.item_count()?, 9);
        let nonce: u64 = rlp.val_at(0)?;
        let v: u64 = rlp.val_at(6)?;
        let r: Vec<u8> = rlp.val_at(7)?;
        assert_eq!(nonce, 9);
        assert!(v == 37 || v == 38);
        assert!(!r.is_empty() && r[0] != 0);
        Ok(())
    }

    #[test]
    fn trims_only_leading_zero_bytes() {
        assert_eq!(trim_leading_zeros(&[0, 0, 1, 0]), vec![1, 0]);
        assert!(trim_leading_zeros(&[0, 0]).is_empty());
    }
}
