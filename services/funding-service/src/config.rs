use anyhow::{Result, anyhow};
use gc_chain_evm::DEFAULT_TOKEN_URI;
use gc_claim_core::FundingPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_PATH: &str = "./data/funding-service";

#[derive(Debug, Clone)]
pub(crate) struct TlsPaths {
    pub(crate) cert: PathBuf,
    pub(crate) key: PathBuf,
}

#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_path: String,
    pub(crate) token_uri: String,
    pub(crate) policy: FundingPolicy,
    pub(crate) tls: Option<TlsPaths>,
}

impl ServiceConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let bind_addr = env_or("GIFT_BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .map_err(|err| anyhow!("GIFT_BIND_ADDR: {err}"))?;

        let mut policy = FundingPolicy::default();
        if let Some(buffer) = env_parse::<u128>("GIFT_FUNDING_BUFFER_WEI")? {
            policy.buffer_wei = buffer;
        }
        if let Some(margin) = env_parse::<u64>("GIFT_GAS_MARGIN_PCT")? {
            policy.gas_margin_pct = margin;
        }
        policy.max_transfer_wei = env_parse::<u128>("GIFT_MAX_FUNDING_WEI")?;

        let tls = match (env_opt("GIFT_TLS_CERT"), env_opt("GIFT_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(anyhow!("GIFT_TLS_CERT and GIFT_TLS_KEY must be set together")),
        };

        Ok(Self {
            bind_addr,
            db_path: env_or("GIFT_DB_PATH", DEFAULT_DB_PATH),
            token_uri: env_or("GIFT_TOKEN_URI", DEFAULT_TOKEN_URI),
            policy,
            tls,
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_owned())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(name)
        .map(|raw| raw.parse::<T>().map_err(|err| anyhow!("{name}: {err}")))
        .transpose()
}
