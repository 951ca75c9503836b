//! Claim status transitions.
//!
//! Every `(status, event)` pair has a defined outcome: pairs missing from the
//! table below leave the state untouched.
//!
//! | from          | event              | to            |
//! |---------------|--------------------|---------------|
//! | `checking`    | `NoPriorClaim`     | `not_started` |
//! | `checking`    | `PriorClaimFound`  | `completed`   |
//! | `not_started` | `ClaimRequested`   | `funding`     |
//! | `funding`     | `Funded`           | `in_progress` |
//! | `funding`     | `FundingFailed`    | `not_started` |
//! | `in_progress` | `Minted`           | `completed`   |
//! | `in_progress` | `MintFailed`       | `not_started` |

use gc_api_types::{ClaimStatus, TokenId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimEvent {
    NoPriorClaim,
    /// The wallet already holds a gift. The id is `None` when the transfer log had no match.
    PriorClaimFound(Option<TokenId>),
    ClaimRequested,
    Funded,
    FundingFailed,
    Minted(TokenId),
    MintFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimState {
    pub status: ClaimStatus,
    pub token_id: Option<TokenId>,
}

impl Default for ClaimState {
    fn default() -> Self {
        Self {
            status: ClaimStatus::Checking,
            token_id: None,
        }
    }
}

impl ClaimState {
    /// Applies `event` and reports whether the state changed.
    pub fn apply(&mut self, event: ClaimEvent) -> bool {
        use ClaimEvent::*;
        use ClaimStatus::*;

        let (next, token_id) = match (self.status, event) {
            (Checking, NoPriorClaim) => (NotStarted, None),
            (Checking, PriorClaimFound(token_id)) => (Completed, token_id),
            (NotStarted, ClaimRequested) => (Funding, None),
            (Funding, Funded) => (InProgress, None),
            (Funding, FundingFailed) => (NotStarted, None),
            (InProgress, Minted(token_id)) => (Completed, Some(token_id)),
            (InProgress, MintFailed) => (NotStarted, None),
            _ => return false,
        };

        self.status = next;
        self.token_id = token_id;
        true
    }

    pub fn can_claim(&self) -> bool {
        self.status == ClaimStatus::NotStarted
    }
}
