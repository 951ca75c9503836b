use anyhow::{Context, Result, anyhow, bail};
use gc_api_types::ClaimStatus;
use gc_chain_evm::{EvmAdapter, EvmConfig};
use gc_claim_core::{
    ClaimAttempt, ClaimSession, ClaimState, ClaimView, ProgressBar, ViewerLinks, WalletProvisioner,
};
use gc_storage::RocksDbStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::args::Cli;
use crate::remote::RemoteFunder;
use crate::render::{progress_line, render_lines};

const PROGRESS_TICK: Duration = Duration::from_secs(1);

/// Everything a command needs, built once from the command line.
pub struct ClaimContext {
    store: RocksDbStore,
    chain: Arc<EvmAdapter>,
    funding_url: String,
    token_uri: String,
}

impl ClaimContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let profile_dir = match &cli.profile_dir {
            Some(dir) => dir.clone(),
            None => default_profile_dir()?,
        };
        std::fs::create_dir_all(&profile_dir)
            .with_context(|| format!("failed to create profile dir {}", profile_dir.display()))?;
        let path = profile_dir
            .to_str()
            .ok_or_else(|| anyhow!("profile dir {} is not valid UTF-8", profile_dir.display()))?;
        let store = RocksDbStore::open_default(path)?;
        info!("using profile at {}", profile_dir.display());

        let mut config = EvmConfig::new(cli.rpc_url.as_str(), cli.contract_address);
        config.chain_id = cli.chain_id;
        config.from_block = cli.from_block;
        config.receipt_poll_interval = Duration::from_millis(cli.receipt_poll_ms);
        config.receipt_timeout = cli.receipt_timeout_secs.map(Duration::from_secs);

        Ok(Self {
            store,
            chain: Arc::new(EvmAdapter::new(config)),
            funding_url: cli.funding_url.clone(),
            token_uri: cli.token_uri.clone(),
        })
    }

    fn links(&self) -> ViewerLinks {
        ViewerLinks::opensea_base(self.chain.config().contract_address)
    }

    async fn open_session(&self) -> Result<ClaimSession> {
        let session = ClaimSession::open(
            &self.store,
            self.chain.clone(),
            Arc::new(RemoteFunder::new(&self.funding_url)),
            self.token_uri.clone(),
        )
        .await?;
        Ok(session)
    }

    fn print_state(&self, session: &ClaimSession, state: &ClaimState, bar: &ProgressBar) {
        let view = ClaimView::render(state, &session.wallet_address(), bar, &self.links());
        for line in render_lines(&view) {
            println!("{line}");
        }
    }
}

/// `~/.local/share/gift-claim` or the platform equivalent.
pub fn default_profile_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join("gift-claim"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".gift-claim")))
        .ok_or_else(|| anyhow!("no home directory; pass --profile-dir"))
}

pub async fn address(ctx: &ClaimContext) -> Result<()> {
    let provisioned = WalletProvisioner::new(&ctx.store).provision().await?;
    if provisioned.created {
        println!("Created a new gift wallet.");
    }
    println!("{}", provisioned.wallet.wallet_address());
    Ok(())
}

pub async fn status(ctx: &ClaimContext) -> Result<()> {
    let session = ctx.open_session().await?;
    let state = session.state();

    println!("Wallet: {}", session.wallet_address());
    println!("Status: {}", state.status);
    ctx.print_state(&session, &state, &ProgressBar::default());

    if state.status == ClaimStatus::Checking {
        bail!("could not reach the chain to check for a prior claim; try again");
    }
    Ok(())
}

pub async fn claim(ctx: &ClaimContext) -> Result<()> {
    let session = ctx.open_session().await?;
    if session.status() == ClaimStatus::Checking {
        session.check_prior_claim().await?;
    }
    println!("Wallet: {}", session.wallet_address());

    let mut bar = ProgressBar::default();
    if session.status() == ClaimStatus::Completed {
        ctx.print_state(&session, &session.state(), &bar);
        return Ok(());
    }

    let mut updates = session.subscribe();
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    ticker.tick().await;

    let claim = session.claim();
    tokio::pin!(claim);

    let result = loop {
        tokio::select! {
            result = &mut claim => break result,
            Ok(()) = updates.changed() => {
                let state = updates.borrow_and_update().clone();
                match state.status {
                    ClaimStatus::Funding => ctx.print_state(&session, &state, &bar),
                    ClaimStatus::InProgress => {
                        bar.reset();
                        ctx.print_state(&session, &state, &bar);
                    }
                    _ => {}
                }
            }
            _ = ticker.tick() => {
                if session.status() == ClaimStatus::InProgress && bar.percent() < 100 {
                    bar.tick();
                    println!("{}", progress_line(bar.percent(), bar.message()));
                }
            }
        }
    };

    match result {
        Ok(ClaimAttempt::Completed(_)) => {
            ctx.print_state(&session, &session.state(), &bar);
            Ok(())
        }
        Ok(ClaimAttempt::Ignored(status)) => {
            println!("Nothing to claim while {status}.");
            ctx.print_state(&session, &session.state(), &bar);
            Ok(())
        }
        Err(err) => {
            ctx.print_state(&session, &session.state(), &bar);
            Err(err.into())
        }
    }
}
