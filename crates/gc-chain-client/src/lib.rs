use anyhow::Result;
use async_trait::async_trait;
use gc_api_types::{TokenId, TxHash, WalletAddress};
use gc_crypto::Signer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
}

/// A `Transfer(from, to, tokenId)` entry from the gift contract's event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: WalletAddress,
    pub to: WalletAddress,
    pub token_id: TokenId,
    pub tx_hash: TxHash,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub token_uri: String,
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// Ledger operations against a single network and a single gift contract.
///
/// Amounts are in wei. Implementations own transaction encoding, nonce lookup
/// and signing through the supplied [`Signer`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn network(&self) -> &str;
    fn contract_address(&self) -> WalletAddress;

    async fn native_balance(&self, address: &WalletAddress) -> Result<u128>;
    async fn gas_price(&self) -> Result<u128>;
    async fn estimate_mint_gas(&self, minter: &WalletAddress, token_uri: &str) -> Result<u64>;

    async fn send_value(
        &self,
        signer: &dyn Signer,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash>;
    async fn send_mint(&self, signer: &dyn Signer, req: &MintRequest) -> Result<TxHash>;
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt>;

    /// Number of gift tokens held by `owner` (`balanceOf`).
    async fn token_balance(&self, owner: &WalletAddress) -> Result<u128>;
    /// Transfer events whose recipient is `recipient`, oldest first.
    ///
    /// `from_block` narrows the scan; `None` scans from the contract's deploy block.
    async fn transfers_to(
        &self,
        recipient: &WalletAddress,
        from_block: Option<u64>,
    ) -> Result<Vec<TransferEvent>>;
}
