//! Client for the funding service's `POST /fund`.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use gc_api_types::{ErrorResponse, FundRequest, FundResponse, TxHash, WalletAddress};
use gc_claim_core::{Funder, FundingQuote, FundingReceipt};
use tracing::debug;

pub struct RemoteFunder {
    http: reqwest::Client,
    fund_url: String,
}

impl RemoteFunder {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            fund_url: format!("{}/fund", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl Funder for RemoteFunder {
    async fn fund(&self, recipient: &WalletAddress) -> Result<FundingReceipt> {
        debug!("requesting funding for {} from {}", recipient, self.fund_url);
        let response = self
            .http
            .post(&self.fund_url)
            .json(&FundRequest {
                wallet_address: recipient.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("funding service unreachable at {}", self.fund_url))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(anyhow!("funding service returned {status}: {message}"));
        }

        let body = response
            .json::<FundResponse>()
            .await
            .context("funding service sent an unreadable response")?;
        receipt_from_response(recipient, body)
    }
}

fn receipt_from_response(recipient: &WalletAddress, body: FundResponse) -> Result<FundingReceipt> {
    let funded = body
        .wallet_address
        .parse::<WalletAddress>()
        .context("wallet_address")?;
    if funded != *recipient {
        return Err(anyhow!("funding service funded {funded}, expected {recipient}"));
    }

    Ok(FundingReceipt {
        quote: FundingQuote {
            gas_limit: body.gas_limit,
            gas_price: parse_wei("gas_price_wei", &body.gas_price_wei)?,
            buffer: parse_wei("buffer_wei", &body.buffer_wei)?,
        },
        balance: parse_wei("balance_wei", &body.balance_wei)?,
        transferred: parse_wei("transferred_wei", &body.transferred_wei)?,
        tx_hash: body.tx_hash.map(TxHash),
    })
}

fn parse_wei(field: &str, raw: &str) -> Result<u128> {
    raw.parse::<u128>()
        .with_context(|| format!("{field} is not a decimal wei amount: {raw}"))
}
