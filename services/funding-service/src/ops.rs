use axum::{
    Json,
    extract::{Query, State},
};
use gc_storage::FundingEventRecord;
use serde::{Deserialize, Serialize};

use crate::{AppState, ApiResult, internal_error};

#[derive(Debug, Deserialize)]
pub(crate) struct FundingEventsQuery {
    pub(crate) limit: Option<usize>,
    pub(crate) wallet_address: Option<String>,
    pub(crate) outcome: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FundingEventsResponse {
    pub(crate) events: Vec<FundingEventRecord>,
}

pub(crate) async fn list_funding_events(
    State(state): State<AppState>,
    Query(query): Query<FundingEventsQuery>,
) -> ApiResult<FundingEventsResponse> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);

    let events = state
        .store
        .list_funding_events(
            limit,
            query.wallet_address.as_deref(),
            query.outcome.as_deref(),
        )
        .map_err(internal_error)?;

    Ok(Json(FundingEventsResponse { events }))
}
