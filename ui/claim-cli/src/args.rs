use clap::{Parser, Subcommand};
use gc_api_types::WalletAddress;
use gc_chain_evm::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_RPC_URL, DEFAULT_TOKEN_URI};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "claim-cli",
    version,
    about = "Claim a gift token into a wallet kept on this machine",
    long_about = None
)]
pub struct Cli {
    /// Directory holding the local key store
    #[arg(long, global = true, env = "GIFT_PROFILE_DIR")]
    pub profile_dir: Option<PathBuf>,

    /// JSON-RPC endpoint of the chain hosting the gift contract
    #[arg(long, global = true, env = "GIFT_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Base URL of the funding service
    #[arg(
        long,
        global = true,
        env = "GIFT_FUNDING_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    pub funding_url: String,

    #[arg(
        long,
        global = true,
        env = "GIFT_CONTRACT_ADDRESS",
        default_value = DEFAULT_CONTRACT_ADDRESS
    )]
    pub contract_address: WalletAddress,

    /// Metadata URI passed to `mint`
    #[arg(long, global = true, env = "GIFT_TOKEN_URI", default_value = DEFAULT_TOKEN_URI)]
    pub token_uri: String,

    /// Chain id for signing (queried from the endpoint when omitted)
    #[arg(long, global = true, env = "GIFT_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// First block scanned for Transfer logs
    #[arg(long, global = true, env = "GIFT_CONTRACT_DEPLOY_BLOCK", default_value_t = 0)]
    pub from_block: u64,

    #[arg(long, global = true, env = "GIFT_RECEIPT_POLL_MS", default_value_t = 2000)]
    pub receipt_poll_ms: u64,

    /// Give up waiting for a receipt after this many seconds
    #[arg(long, global = true, env = "GIFT_RECEIPT_TIMEOUT_SECS")]
    pub receipt_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the gift wallet address, creating the wallet if needed
    Address,

    /// Show whether the gift has been claimed
    Status,

    /// Fund the wallet and mint the gift
    Claim,
}
