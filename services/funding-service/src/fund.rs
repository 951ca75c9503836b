use axum::{Json, extract::State};
use gc_api_types::{FundRequest, FundResponse, WalletAddress};
use gc_claim_core::{FundingReceipt, FundingRefused};
use gc_storage::FundingEventRecord;
use tracing::{info, warn};

use crate::{AppState, ApiResult, bad_gateway, bad_request, conflict, epoch_ms};

pub(crate) const OUTCOME_FUNDED: &str = "funded";
pub(crate) const OUTCOME_SKIPPED: &str = "skipped";
pub(crate) const OUTCOME_REFUSED: &str = "refused";
pub(crate) const OUTCOME_FAILED: &str = "failed";

pub(crate) async fn fund_wallet(
    State(state): State<AppState>,
    Json(request): Json<FundRequest>,
) -> ApiResult<FundResponse> {
    if request.wallet_address.trim().is_empty() {
        return Err(bad_request("wallet_address is required"));
    }

    let wallet = request
        .wallet_address
        .trim()
        .parse::<WalletAddress>()
        .map_err(|err| bad_request(&err.to_string()))?;

    match state.funder.fund(&wallet).await {
        Ok(receipt) => {
            let outcome = if receipt.tx_hash.is_some() {
                OUTCOME_FUNDED
            } else {
                OUTCOME_SKIPPED
            };
            info!("fund {} -> {}", wallet, outcome);
            record_event(&state, success_record(&wallet, outcome, &receipt));
            Ok(Json(fund_response(&wallet, &receipt)))
        }
        Err(err) => {
            let refused = err.downcast_ref::<FundingRefused>().cloned();
            let outcome = if refused.is_some() {
                OUTCOME_REFUSED
            } else {
                OUTCOME_FAILED
            };
            warn!("fund {} -> {}: {:#}", wallet, outcome, err);
            record_event(
                &state,
                FundingEventRecord {
                    event_id: String::new(),
                    wallet_address: wallet.to_string(),
                    outcome: outcome.to_owned(),
                    required_wei: None,
                    balance_wei: None,
                    transferred_wei: None,
                    tx_hash: None,
                    message: Some(format!("{err:#}")),
                    timestamp_epoch_ms: epoch_ms().unwrap_or_default(),
                },
            );
            Err(match refused {
                Some(FundingRefused::AlreadyClaimed(_)) => conflict(err.to_string()),
                _ => bad_gateway(format!("funding failed: {err:#}")),
            })
        }
    }
}

fn fund_response(wallet: &WalletAddress, receipt: &FundingReceipt) -> FundResponse {
    FundResponse {
        wallet_address: wallet.to_string(),
        gas_limit: receipt.quote.gas_limit,
        gas_price_wei: receipt.quote.gas_price.to_string(),
        buffer_wei: receipt.quote.buffer.to_string(),
        required_wei: receipt.quote.required().to_string(),
        balance_wei: receipt.balance.to_string(),
        transferred_wei: receipt.transferred.to_string(),
        tx_hash: receipt.tx_hash.as_ref().map(|hash| hash.0.clone()),
    }
}

fn success_record(wallet: &WalletAddress, outcome: &str, receipt: &FundingReceipt) -> FundingEventRecord {
    FundingEventRecord {
        event_id: String::new(),
        wallet_address: wallet.to_string(),
        outcome: outcome.to_owned(),
        required_wei: Some(receipt.quote.required().to_string()),
        balance_wei: Some(receipt.balance.to_string()),
        transferred_wei: Some(receipt.transferred.to_string()),
        tx_hash: receipt.tx_hash.as_ref().map(|hash| hash.0.clone()),
        message: None,
        timestamp_epoch_ms: epoch_ms().unwrap_or_default(),
    }
}

/// Audit writes never fail the request.
fn record_event(state: &AppState, record: FundingEventRecord) {
    if let Err(err) = state.store.append_funding_event(record) {
        warn!("failed to append funding event: {}", err);
    }
}
