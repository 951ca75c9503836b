use anyhow::anyhow;
use gc_api_types::{ClaimStatus, TokenId, WalletAddress};
use gc_chain_client::{ChainClient, MintRequest};
use gc_crypto::WalletKey;
use gc_storage::Keystore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ClaimError;
use crate::funding::{Funder, FundingQuote};
use crate::provisioner::WalletProvisioner;
use crate::state::{ClaimEvent, ClaimState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimAttempt {
    /// The claim was not started because the status was not `not_started`.
    Ignored(ClaimStatus),
    Completed(TokenId),
}

/// One visitor's claim: their wallet, the current status, and the
/// fund-then-mint sequence.
///
/// State changes are published on a watch channel; see [`ClaimSession::subscribe`].
pub struct ClaimSession {
    wallet: Arc<WalletKey>,
    chain: Arc<dyn ChainClient>,
    funder: Arc<dyn Funder>,
    token_uri: String,
    state: watch::Sender<ClaimState>,
}

impl ClaimSession {
    pub fn new(
        wallet: WalletKey,
        chain: Arc<dyn ChainClient>,
        funder: Arc<dyn Funder>,
        token_uri: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(ClaimState::default());
        Self {
            wallet: Arc::new(wallet),
            chain,
            funder,
            token_uri: token_uri.into(),
            state,
        }
    }

    /// Provisions the visitor wallet and resolves the initial status.
    ///
    /// A newly created wallet goes straight to `not_started`. For an existing
    /// wallet a failed ownership lookup is logged and leaves the session in
    /// `checking`; call [`ClaimSession::check_prior_claim`] to retry.
    pub async fn open<K>(
        keystore: &K,
        chain: Arc<dyn ChainClient>,
        funder: Arc<dyn Funder>,
        token_uri: impl Into<String>,
    ) -> Result<Self, ClaimError>
    where
        K: Keystore + ?Sized,
    {
        let provisioned = WalletProvisioner::new(keystore).provision().await?;
        let session = Self::new(provisioned.wallet, chain, funder, token_uri);

        if provisioned.created {
            session.apply(ClaimEvent::NoPriorClaim);
        } else if let Err(err) = session.check_prior_claim().await {
            warn!(
                "could not determine claim status for {}: {}",
                session.wallet_address(),
                err
            );
        }

        Ok(session)
    }

    pub fn wallet_address(&self) -> WalletAddress {
        self.wallet.wallet_address()
    }

    pub fn state(&self) -> ClaimState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ClaimStatus {
        self.state.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<ClaimState> {
        self.state.subscribe()
    }

    fn apply(&self, event: ClaimEvent) -> bool {
        self.state.send_if_modified(|state| state.apply(event))
    }

    /// Looks up whether the wallet already holds a gift. Only acts in `checking`.
    pub async fn check_prior_claim(&self) -> Result<ClaimStatus, ClaimError> {
        if self.status() != ClaimStatus::Checking {
            return Ok(self.status());
        }

        let address = self.wallet_address();
        let owned = self
            .chain
            .token_balance(&address)
            .await
            .map_err(ClaimError::StatusQuery)?;

        if owned == 0 {
            self.apply(ClaimEvent::NoPriorClaim);
            return Ok(self.status());
        }

        let token_id = match self.chain.transfers_to(&address, None).await {
            Ok(events) => events.first().map(|event| event.token_id.clone()),
            Err(err) => {
                warn!("gift owned by {} but transfer lookup failed: {}", address, err);
                None
            }
        };
        info!(
            "wallet {} already claimed token {:?}",
            address,
            token_id.as_ref().map(|id| id.0.as_str())
        );
        self.apply(ClaimEvent::PriorClaimFound(token_id));
        Ok(self.status())
    }

    /// Runs fund-then-mint. Does nothing unless the status is `not_started`.
    ///
    /// Any failure returns the session to `not_started`; the error is
    /// returned for diagnostics only.
    pub async fn claim(&self) -> Result<ClaimAttempt, ClaimError> {
        if !self.apply(ClaimEvent::ClaimRequested) {
            let status = self.status();
            debug!("claim ignored while {}", status);
            return Ok(ClaimAttempt::Ignored(status));
        }

        let address = self.wallet_address();
        let funding = match self.funder.fund(&address).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!("funding {} failed: {:#}", address, err);
                self.apply(ClaimEvent::FundingFailed);
                return Err(ClaimError::Funding(err));
            }
        };
        self.apply(ClaimEvent::Funded);

        match self.mint(&address, &funding.quote).await {
            Ok(token_id) => {
                info!("wallet {} minted token {}", address, token_id);
                self.apply(ClaimEvent::Minted(token_id.clone()));
                Ok(ClaimAttempt::Completed(token_id))
            }
            Err(err) => {
                error!("minting for {} failed: {:#}", address, err);
                self.apply(ClaimEvent::MintFailed);
                Err(ClaimError::Mint(err))
            }
        }
    }

    async fn mint(&self, address: &WalletAddress, quote: &FundingQuote) -> anyhow::Result<TokenId> {
        let request = MintRequest {
            token_uri: self.token_uri.clone(),
            gas_limit: quote.gas_limit,
            gas_price: quote.gas_price,
        };

        let tx_hash = self.chain.send_mint(self.wallet.as_ref(), &request).await?;
        let receipt = self.chain.wait_for_receipt(&tx_hash).await?;
        if !receipt.success {
            return Err(anyhow!("mint transaction {tx_hash} reverted"));
        }

        let events = self
            .chain
            .transfers_to(address, Some(receipt.block_number))
            .await?;
        events
            .iter()
            .find(|event| event.tx_hash == tx_hash)
            .or_else(|| events.last())
            .map(|event| event.token_id.clone())
            .ok_or_else(|| anyhow!("no Transfer event for {address} after mint {tx_hash}"))
    }
}
