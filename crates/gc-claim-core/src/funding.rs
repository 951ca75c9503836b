//! Funding the visitor wallet so it can pay for its own mint.
//!
//! One policy is used everywhere: estimate the mint gas for the visitor,
//! widen it by a margin, price it at the current gas price, add a fixed
//! buffer, and transfer only the shortfall against the visitor's balance.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use gc_api_types::{TxHash, WalletAddress};
use gc_chain_client::ChainClient;
use gc_crypto::Signer;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 0.001 ETH.
pub const DEFAULT_BUFFER_WEI: u128 = 1_000_000_000_000_000;
pub const DEFAULT_GAS_MARGIN_PCT: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingPolicy {
    pub buffer_wei: u128,
    pub gas_margin_pct: u64,
    /// Refuse single transfers above this amount.
    pub max_transfer_wei: Option<u128>,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            buffer_wei: DEFAULT_BUFFER_WEI,
            gas_margin_pct: DEFAULT_GAS_MARGIN_PCT,
            max_transfer_wei: None,
        }
    }
}

impl FundingPolicy {
    pub fn quote(&self, estimated_gas: u64, gas_price: u128) -> FundingQuote {
        let margin = estimated_gas.saturating_mul(self.gas_margin_pct) / 100;
        FundingQuote {
            gas_limit: estimated_gas.saturating_add(margin),
            gas_price,
            buffer: self.buffer_wei,
        }
    }
}

/// Gas terms the mint will be sent with, and what funding must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingQuote {
    pub gas_limit: u64,
    pub gas_price: u128,
    pub buffer: u128,
}

impl FundingQuote {
    pub fn required(&self) -> u128 {
        u128::from(self.gas_limit)
            .saturating_mul(self.gas_price)
            .saturating_add(self.buffer)
    }

    pub fn shortfall(&self, balance: u128) -> u128 {
        self.required().saturating_sub(balance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingReceipt {
    pub quote: FundingQuote,
    pub balance: u128,
    pub transferred: u128,
    pub tx_hash: Option<TxHash>,
}

/// Requests the funder turns down without touching the sender wallet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FundingRefused {
    #[error("wallet {0} already holds a gift")]
    AlreadyClaimed(WalletAddress),
    #[error("funding of {required} wei exceeds the {cap} wei cap")]
    OverCap { required: u128, cap: u128 },
}

#[async_trait]
pub trait Funder: Send + Sync {
    /// Ensures `recipient` can pay for its mint, waiting for any transfer to confirm.
    async fn fund(&self, recipient: &WalletAddress) -> Result<FundingReceipt>;
}

/// Funds visitors from the custodial sender wallet.
///
/// Requests are served one at a time: the lock is held from the ownership
/// and balance checks until the transfer confirms, so a visitor is never
/// funded twice off a stale balance and sender nonces are never contended.
/// Wallets that already hold a gift are refused.
pub struct CustodialFunder {
    chain: Arc<dyn ChainClient>,
    sender: Arc<dyn Signer>,
    policy: FundingPolicy,
    token_uri: String,
    sender_lock: Mutex<()>,
}

impl CustodialFunder {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        sender: Arc<dyn Signer>,
        policy: FundingPolicy,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            sender,
            policy,
            token_uri: token_uri.into(),
            sender_lock: Mutex::new(()),
        }
    }

    pub fn sender_address(&self) -> WalletAddress {
        self.sender.address()
    }

    pub async fn quote(&self, recipient: &WalletAddress) -> Result<FundingQuote> {
        let estimated_gas = self
            .chain
            .estimate_mint_gas(recipient, &self.token_uri)
            .await?;
        let gas_price = self.chain.gas_price().await?;
        Ok(self.policy.quote(estimated_gas, gas_price))
    }
}

#[async_trait]
impl Funder for CustodialFunder {
    async fn fund(&self, recipient: &WalletAddress) -> Result<FundingReceipt> {
        let _sender = self.sender_lock.lock().await;

        if self.chain.token_balance(recipient).await? > 0 {
            warn!("refusing to fund {}: gift already claimed", recipient);
            return Err(FundingRefused::AlreadyClaimed(*recipient).into());
        }

        let quote = self.quote(recipient).await?;
        let balance = self.chain.native_balance(recipient).await?;
        let shortfall = quote.shortfall(balance);

        if shortfall == 0 {
            info!(
                "wallet {} already holds {} wei (needs {})",
                recipient,
                balance,
                quote.required()
            );
            return Ok(FundingReceipt {
                quote,
                balance,
                transferred: 0,
                tx_hash: None,
            });
        }

        if let Some(cap) = self.policy.max_transfer_wei {
            if shortfall > cap {
                warn!(
                    "refusing to send {} wei to {}: above cap of {} wei",
                    shortfall, recipient, cap
                );
                return Err(FundingRefused::OverCap {
                    required: shortfall,
                    cap,
                }
                .into());
            }
        }

        let tx_hash = self
            .chain
            .send_value(self.sender.as_ref(), recipient, shortfall)
            .await?;
        let receipt = self.chain.wait_for_receipt(&tx_hash).await?;
        if !receipt.success {
            return Err(anyhow!("funding transfer {tx_hash} reverted"));
        }

        info!("funded {} with {} wei in {}", recipient, shortfall, tx_hash);
        Ok(FundingReceipt {
            quote,
            balance,
            transferred: shortfall,
            tx_hash: Some(tx_hash),
        })
    }
}
