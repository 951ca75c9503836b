//! Gift contract interface: `balanceOf`, `mint(string)` and the ERC-721
//! `Transfer` event.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, sol};
use anyhow::{Result, anyhow};
use gc_api_types::{TokenId, WalletAddress};

sol! {
    function balanceOf(address owner) external view returns (uint256);
    function mint(string tokenURI) external;
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}

/// Decoded `Transfer` log fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLog {
    pub from: WalletAddress,
    pub to: WalletAddress,
    pub token_id: TokenId,
}

pub fn transfer_topic() -> B256 {
    Transfer::SIGNATURE_HASH
}

/// Topic value matching an indexed `address` parameter.
pub fn address_topic(address: &WalletAddress) -> B256 {
    Address::from(*address).into_word()
}

pub fn encode_balance_of(owner: &WalletAddress) -> Vec<u8> {
    balanceOfCall {
        owner: Address::from(*owner),
    }
    .abi_encode()
}

pub fn decode_balance_of(data: &[u8]) -> Result<u128> {
    let balance: U256 = balanceOfCall::abi_decode_returns(data)
        .map_err(|err| anyhow!("balanceOf returned malformed data: {err}"))?;
    Ok(balance.saturating_to::<u128>())
}

pub fn encode_mint(token_uri: &str) -> Vec<u8> {
    mintCall {
        tokenURI: token_uri.to_owned(),
    }
    .abi_encode()
}

pub fn decode_transfer(topics: &[B256], data: &[u8]) -> Result<TransferLog> {
    let event = Transfer::decode_raw_log(topics.iter().copied(), data)
        .map_err(|err| anyhow!("not a Transfer log: {err}"))?;
    Ok(TransferLog {
        from: event.from.into(),
        to: event.to.into(),
        token_id: TokenId(event.tokenId.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    fn owner() -> WalletAddress {
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
            .parse()
            .expect("valid address")
    }

    #[test]
    fn well_known_selectors_and_topics() {
        assert_eq!(hex::encode(balanceOfCall::SELECTOR), "70a08231");
        assert_eq!(
            hex::encode(transfer_topic()),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn balance_of_call_data_carries_the_owner() {
        let data = encode_balance_of(&owner());
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &balanceOfCall::SELECTOR);
        assert_eq!(&data[16..], owner().as_bytes());
    }

    #[test]
    fn mint_call_data_decodes_back_to_the_uri() -> Result<()> {
        let uri = "https://cdn.chainlabs.in/metadata.json";
        let data = encode_mint(uri);

        assert_eq!(&data[..4], &mintCall::SELECTOR);
        assert_eq!((data.len() - 4) % 32, 0);
        let decoded = mintCall::abi_decode(&data)?;
        assert_eq!(decoded.tokenURI, uri);
        Ok(())
    }

    #[test]
    fn balance_saturates_oversized_values() -> Result<()> {
        assert_eq!(decode_balance_of(&U256::from(7).abi_encode())?, 7);
        assert_eq!(decode_balance_of(&U256::MAX.abi_encode())?, u128::MAX);
        assert!(decode_balance_of(&[0_u8; 3]).is_err());
        Ok(())
    }

    #[test]
    fn transfer_log_decodes_indexed_token_id() -> Result<()> {
        let topics = [
            transfer_topic(),
            address_topic(&WalletAddress([0; 20])),
            address_topic(&owner()),
            B256::left_padding_from(&[42]),
        ];
        let log = decode_transfer(&topics, &[])?;

        assert_eq!(log.from, WalletAddress([0; 20]));
        assert_eq!(log.to, owner());
        assert_eq!(log.token_id, TokenId("42".to_owned()));
        Ok(())
    }

    #[test]
    fn other_events_are_rejected() {
        let topics = [B256::repeat_byte(0x11), address_topic(&owner())];
        assert!(decode_transfer(&topics, &[]).is_err());
    }
}
