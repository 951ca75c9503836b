pub mod abi;
pub mod tx;

use alloy_primitives::B256;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use gc_api_types::{TxHash, WalletAddress};
use gc_chain_client::{ChainClient, MintRequest, TransferEvent, TxReceipt};
use gc_crypto::Signer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::tx::LegacyTransaction;

pub const BASE_MAINNET: &str = "base-mainnet";
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xf9dE025Ba389114442d949c60De81C3120eE51FE";
pub const DEFAULT_TOKEN_URI: &str = "https://cdn.chainlabs.in/metadata.json";
pub const VALUE_TRANSFER_GAS: u64 = 21_000;

#[derive(Debug, Clone)]
pub struct EvmConfig {
    pub rpc_url: String,
    /// Queried with `eth_chainId` on first use when unset.
    pub chain_id: Option<u64>,
    pub contract_address: WalletAddress,
    /// First block scanned for `Transfer` logs.
    pub from_block: u64,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Option<Duration>,
}

impl EvmConfig {
    pub fn new(rpc_url: impl Into<String>, contract_address: WalletAddress) -> Self {
        Self {
            rpc_url: rpc_url.into().trim_end_matches('/').to_string(),
            chain_id: None,
            contract_address,
            from_block: 0,
            receipt_poll_interval: Duration::from_secs(2),
            receipt_timeout: None,
        }
    }

    /// Reads `GIFT_RPC_URL`, `GIFT_CHAIN_ID`, `GIFT_CONTRACT_ADDRESS`,
    /// `GIFT_CONTRACT_DEPLOY_BLOCK`, `GIFT_RECEIPT_POLL_MS` and
    /// `GIFT_RECEIPT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("GIFT_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let contract_address = std::env::var("GIFT_CONTRACT_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string())
            .parse::<WalletAddress>()
            .context("GIFT_CONTRACT_ADDRESS")?;

        let mut config = Self::new(rpc_url, contract_address);
        config.chain_id = env_parse::<u64>("GIFT_CHAIN_ID")?;
        if let Some(block) = env_parse::<u64>("GIFT_CONTRACT_DEPLOY_BLOCK")? {
            config.from_block = block;
        }
        if let Some(ms) = env_parse::<u64>("GIFT_RECEIPT_POLL_MS")? {
            config.receipt_poll_interval = Duration::from_millis(ms);
        }
        config.receipt_timeout = env_parse::<u64>("GIFT_RECEIPT_TIMEOUT_SECS")?.map(Duration::from_secs);
        Ok(config)
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("{name}: {err}")),
        _ => Ok(None),
    }
}

/// JSON-RPC adapter for an EVM network hosting the gift contract.
pub struct EvmAdapter {
    config: EvmConfig,
    http: reqwest::Client,
    chain_id: OnceCell<u64>,
    next_request_id: AtomicU64,
}

impl EvmAdapter {
    pub fn new(config: EvmConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            chain_id: OnceCell::new(),
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    async fn chain_id(&self) -> Result<u64> {
        let configured = self.config.chain_id;
        self.chain_id
            .get_or_try_init(|| async move {
                match configured {
                    Some(id) => Ok(id),
                    None => {
                        let raw: String = self.rpc("eth_chainId", json!([])).await?;
                        parse_quantity_u64(&raw)
                    }
                }
            })
            .await
            .copied()
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        self.rpc_optional(method, params)
            .await?
            .ok_or_else(|| anyhow!("{method}: empty result"))
    }

    async fn rpc_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{method} transport"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{method} HTTP {status}: {text}");
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .with_context(|| format!("{method} parse"))?;

        if let Some(err) = envelope.error {
            anyhow::bail!("{method} RPC error {}: {}", err.code, err.message);
        }

        Ok(envelope.result)
    }

    async fn send_transaction(
        &self,
        signer: &dyn Signer,
        to: WalletAddress,
        value: u128,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: u128,
    ) -> Result<TxHash> {
        let chain_id = self.chain_id().await?;
        let from = signer.address();
        let nonce: String = self
            .rpc("eth_getTransactionCount", json!([from.to_string(), "pending"]))
            .await?;

        let tx = LegacyTransaction {
            nonce: parse_quantity_u64(&nonce)?,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            chain_id,
        };
        let raw = tx.sign(signer)?;

        let tx_hash: String = self
            .rpc("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))
            .await?;
        debug!("submitted tx {} from {} nonce {}", tx_hash, from, tx.nonce);

        Ok(TxHash(tx_hash))
    }
}

// ── JSON-RPC wire types ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptResponse {
    transaction_hash: String,
    block_number: Option<String>,
    gas_used: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogResponse {
    topics: Vec<String>,
    #[serde(default)]
    data: String,
    transaction_hash: Option<String>,
    block_number: Option<String>,
}

#[async_trait]
impl ChainClient for EvmAdapter {
    fn network(&self) -> &str {
        BASE_MAINNET
    }

    fn contract_address(&self) -> WalletAddress {
        self.config.contract_address
    }

    async fn native_balance(&self, address: &WalletAddress) -> Result<u128> {
        let raw: String = self
            .rpc("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_quantity_u128(&raw)
    }

    async fn gas_price(&self) -> Result<u128> {
        let raw: String = self.rpc("eth_gasPrice", json!([])).await?;
        parse_quantity_u128(&raw)
    }

    async fn estimate_mint_gas(&self, minter: &WalletAddress, token_uri: &str) -> Result<u64> {
        let call = json!({
            "from": minter.to_string(),
            "to": self.config.contract_address.to_string(),
            "data": format!("0x{}", hex::encode(abi::encode_mint(token_uri))),
        });
        let raw: String = self.rpc("eth_estimateGas", json!([call])).await?;
        parse_quantity_u64(&raw)
    }

    async fn send_value(
        &self,
        signer: &dyn Signer,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash> {
        let gas_price = self.gas_price().await?;
        self.send_transaction(signer, *to, amount, Vec::new(), VALUE_TRANSFER_GAS, gas_price)
            .await
    }

    async fn send_mint(&self, signer: &dyn Signer, req: &MintRequest) -> Result<TxHash> {
        self.send_transaction(
            signer,
            self.config.contract_address,
            0,
            abi::encode_mint(&req.token_uri),
            req.gas_limit,
            req.gas_price,
        )
        .await
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt> {
        let started = Instant::now();
        loop {
            let receipt: Option<ReceiptResponse> = self
                .rpc_optional("eth_getTransactionReceipt", json!([tx_hash.0]))
                .await?;

            if let Some(receipt) = receipt {
                if receipt.block_number.is_some() {
                    let receipt = parse_receipt(receipt)?;
                    info!(
                        "tx {} confirmed in block {} (success: {})",
                        receipt.tx_hash, receipt.block_number, receipt.success
                    );
                    return Ok(receipt);
                }
            }

            if let Some(timeout) = self.config.receipt_timeout {
                if started.elapsed() >= timeout {
                    anyhow::bail!("timed out waiting for receipt of {}", tx_hash);
                }
            }

            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
    }

    async fn token_balance(&self, owner: &WalletAddress) -> Result<u128> {
        let call = json!({
            "to": self.config.contract_address.to_string(),
            "data": format!("0x{}", hex::encode(abi::encode_balance_of(owner))),
        });
        let raw: String = self.rpc("eth_call", json!([call, "latest"])).await?;
        abi::decode_balance_of(&decode_hex_data(&raw)?)
    }

    async fn transfers_to(
        &self,
        recipient: &WalletAddress,
        from_block: Option<u64>,
    ) -> Result<Vec<TransferEvent>> {
        let filter = json!({
            "address": self.config.contract_address.to_string(),
            "fromBlock": format!("0x{:x}", from_block.unwrap_or(self.config.from_block)),
            "toBlock": "latest",
            "topics": [
                format!("{:#x}", abi::transfer_topic()),
                serde_json::Value::Null,
                format!("{:#x}", abi::address_topic(recipient)),
            ],
        });

        let logs: Vec<LogResponse> = self.rpc("eth_getLogs", json!([filter])).await?;
        let mut events = logs
            .into_iter()
            .map(parse_transfer_log)
            .collect::<Result<Vec<_>>>()?;
        events.sort_by_key(|event| event.block_number);
        Ok(events)
    }
}

fn parse_receipt(receipt: ReceiptResponse) -> Result<TxReceipt> {
    Ok(TxReceipt {
        tx_hash: TxHash(receipt.transaction_hash),
        block_number: receipt
            .block_number
            .as_deref()
            .map(parse_quantity_u64)
            .transpose()?
            .unwrap_or_default(),
        gas_used: receipt
            .gas_used
            .as_deref()
            .map(parse_quantity_u64)
            .transpose()?
            .unwrap_or_default(),
        // Pre-Byzantium receipts carry no status; treat inclusion as success.
        success: receipt.status.as_deref().map_or(true, |status| {
            parse_quantity_u64(status).map(|value| value == 1).unwrap_or(false)
        }),
    })
}

fn parse_transfer_log(log: LogResponse) -> Result<TransferEvent> {
    let topics = log
        .topics
        .iter()
        .map(|topic| B256::from_str(topic).with_context(|| format!("invalid log topic '{topic}'")))
        .collect::<Result<Vec<_>>>()?;
    let transfer = abi::decode_transfer(&topics, &decode_hex_data(&log.data)?)?;

    Ok(TransferEvent {
        from: transfer.from,
        to: transfer.to,
        token_id: transfer.token_id,
        tx_hash: TxHash(log.transaction_hash.unwrap_or_default()),
        block_number: log
            .block_number
            .as_deref()
            .map(parse_quantity_u64)
            .transpose()?
            .unwrap_or_default(),
    })
}

pub fn parse_quantity_u128(raw: &str) -> Result<u128> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("quantity '{raw}' is missing 0x prefix"))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).with_context(|| format!("invalid quantity '{raw}'"))
}

pub fn parse_quantity_u64(raw: &str) -> Result<u64> {
    let value = parse_quantity_u128(raw)?;
    u64::try_from(value).map_err(|_| anyhow!("quantity '{raw}' does not fit in u64"))
}

fn decode_hex_data(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.trim().strip_prefix("0x").unwrap_or(raw.trim());
    hex::decode(digits).with_context(|| format!("invalid hex data '{raw}'"))
}
