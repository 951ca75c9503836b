mod error;
mod funding;
mod provisioner;
mod session;
mod state;
mod view;

#[cfg(test)]
mod testing;

pub use error::ClaimError;
pub use funding::{
    CustodialFunder, DEFAULT_BUFFER_WEI, DEFAULT_GAS_MARGIN_PCT, Funder, FundingPolicy,
    FundingQuote, FundingReceipt, FundingRefused,
};
pub use provisioner::{ProvisionedWallet, WALLET_KEY_NAME, WalletProvisioner};
pub use session::{ClaimAttempt, ClaimSession};
pub use state::{ClaimEvent, ClaimState};
pub use view::{
    ClaimButton, ClaimView, Completion, PROGRESS_MESSAGES, Progress, ProgressBar, ViewerLinks,
};
