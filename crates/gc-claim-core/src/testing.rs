//! In-memory collaborators for unit tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use gc_api_types::{TokenId, TxHash, WalletAddress};
use gc_chain_client::{ChainClient, MintRequest, TransferEvent, TxReceipt};
use gc_crypto::{Signer, WalletKey};
use gc_storage::{InMemoryKeystore, Keystore};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn test_wallet() -> WalletKey {
    WalletKey::from_private_key_hex(&format!("0x{:064x}", 1)).expect("valid test key")
}

pub(crate) fn sender_wallet() -> WalletKey {
    WalletKey::from_private_key_hex(&format!("0x{:064x}", 2)).expect("valid test key")
}

#[derive(Default)]
pub(crate) struct CountingKeystore {
    inner: InMemoryKeystore,
    writes: AtomicUsize,
}

impl CountingKeystore {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Keystore for CountingKeystore {
    async fn load_key(&self, name: &str) -> Result<Option<String>> {
        self.inner.load_key(name).await
    }

    async fn save_key(&self, name: &str, encoded_key: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_key(name, encoded_key).await
    }
}

#[derive(Default)]
struct FakeChainState {
    estimated_gas: u64,
    gas_price: u128,
    native_balances: HashMap<WalletAddress, u128>,
    token_balances: HashMap<WalletAddress, u128>,
    transfers: HashMap<WalletAddress, Vec<TransferEvent>>,
    /// Success flag and inclusion block per transaction.
    receipts: HashMap<String, (bool, u64)>,
    fail_value_transfers: bool,
    revert_value_transfers: bool,
    fail_mints: bool,
    mint_token_id: Option<String>,
    value_transfers: Vec<(WalletAddress, u128)>,
    mints: Vec<MintRequest>,
    transfer_queries: Vec<Option<u64>>,
    calls: usize,
    next_tx: u64,
}

/// Scriptable [`ChainClient`] that records every call.
#[derive(Default)]
pub(crate) struct FakeChain {
    state: Mutex<FakeChainState>,
}

impl FakeChain {
    fn with<R>(&self, f: impl FnOnce(&mut FakeChainState) -> R) -> R {
        let mut guard = self.state.lock().expect("fake chain lock");
        f(&mut guard)
    }

    fn record_call(&self) {
        self.with(|s| s.calls += 1);
    }

    fn next_hash(state: &mut FakeChainState) -> TxHash {
        state.next_tx += 1;
        TxHash(format!("0x{:064x}", state.next_tx))
    }

    pub(crate) fn set_gas(&self, estimated_gas: u64, gas_price: u128) {
        self.with(|s| {
            s.estimated_gas = estimated_gas;
            s.gas_price = gas_price;
        });
    }

    pub(crate) fn set_native_balance(&self, address: &WalletAddress, amount: u128) {
        self.with(|s| {
            s.native_balances.insert(*address, amount);
        });
    }

    pub(crate) fn set_token_balance(&self, address: &WalletAddress, amount: u128) {
        self.with(|s| {
            s.token_balances.insert(*address, amount);
        });
    }

    pub(crate) fn add_transfer(&self, to: &WalletAddress, token_id: &str) {
        self.with(|s| {
            let tx_hash = Self::next_hash(s);
            let block_number = s.next_tx;
            s.transfers.entry(*to).or_default().push(TransferEvent {
                from: WalletAddress([0; 20]),
                to: *to,
                token_id: TokenId(token_id.to_owned()),
                tx_hash,
                block_number,
            });
        });
    }

    pub(crate) fn fail_value_transfers(&self) {
        self.with(|s| s.fail_value_transfers = true);
    }

    pub(crate) fn revert_value_transfers(&self) {
        self.with(|s| s.revert_value_transfers = true);
    }

    pub(crate) fn fail_mints(&self) {
        self.with(|s| s.fail_mints = true);
    }

    /// Successful mints emit a transfer of `token_id` to the minter.
    pub(crate) fn mint_assigns(&self, token_id: &str) {
        self.with(|s| s.mint_token_id = Some(token_id.to_owned()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.with(|s| s.calls)
    }

    pub(crate) fn value_transfers(&self) -> Vec<(WalletAddress, u128)> {
        self.with(|s| s.value_transfers.clone())
    }

    pub(crate) fn mints(&self) -> Vec<MintRequest> {
        self.with(|s| s.mints.clone())
    }

    /// `from_block` of every `transfers_to` call, in order.
    pub(crate) fn transfer_queries(&self) -> Vec<Option<u64>> {
        self.with(|s| s.transfer_queries.clone())
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn network(&self) -> &str {
        "fake"
    }

    fn contract_address(&self) -> WalletAddress {
        WalletAddress([0xf9; 20])
    }

    async fn native_balance(&self, address: &WalletAddress) -> Result<u128> {
        self.record_call();
        tokio::task::yield_now().await;
        Ok(self.with(|s| s.native_balances.get(address).copied().unwrap_or(0)))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.record_call();
        Ok(self.with(|s| s.gas_price))
    }

    async fn estimate_mint_gas(&self, _minter: &WalletAddress, _token_uri: &str) -> Result<u64> {
        self.record_call();
        Ok(self.with(|s| s.estimated_gas))
    }

    async fn send_value(
        &self,
        _signer: &dyn Signer,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash> {
        self.record_call();
        self.with(|s| {
            if s.fail_value_transfers {
                return Err(anyhow!("network error: connection reset"));
            }
            let tx_hash = Self::next_hash(s);
            let block_number = s.next_tx;
            s.receipts
                .insert(tx_hash.0.clone(), (!s.revert_value_transfers, block_number));
            s.value_transfers.push((*to, amount));
            *s.native_balances.entry(*to).or_default() += amount;
            Ok(tx_hash)
        })
    }

    async fn send_mint(&self, signer: &dyn Signer, req: &MintRequest) -> Result<TxHash> {
        self.record_call();
        let minter = signer.address();
        self.with(|s| {
            if s.fail_mints {
                return Err(anyhow!("execution reverted"));
            }
            let tx_hash = Self::next_hash(s);
            let block_number = s.next_tx;
            s.receipts.insert(tx_hash.0.clone(), (true, block_number));
            s.mints.push(req.clone());
            if let Some(token_id) = s.mint_token_id.clone() {
                s.transfers.entry(minter).or_default().push(TransferEvent {
                    from: WalletAddress([0; 20]),
                    to: minter,
                    token_id: TokenId(token_id),
                    tx_hash: tx_hash.clone(),
                    block_number,
                });
                *s.token_balances.entry(minter).or_default() += 1;
            }
            Ok(tx_hash)
        })
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt> {
        self.record_call();
        tokio::task::yield_now().await;
        let (success, block_number) = self
            .with(|s| s.receipts.get(&tx_hash.0).copied())
            .ok_or_else(|| anyhow!("unknown transaction {tx_hash}"))?;
        Ok(TxReceipt {
            tx_hash: tx_hash.clone(),
            block_number,
            gas_used: 21_000,
            success,
        })
    }

    async fn token_balance(&self, owner: &WalletAddress) -> Result<u128> {
        self.record_call();
        Ok(self.with(|s| s.token_balances.get(owner).copied().unwrap_or(0)))
    }

    async fn transfers_to(
        &self,
        recipient: &WalletAddress,
        from_block: Option<u64>,
    ) -> Result<Vec<TransferEvent>> {
        self.record_call();
        Ok(self.with(|s| {
            s.transfer_queries.push(from_block);
            let from = from_block.unwrap_or(0);
            s.transfers
                .get(recipient)
                .into_iter()
                .flatten()
                .filter(|event| event.block_number >= from)
                .cloned()
                .collect()
        }))
    }
}
