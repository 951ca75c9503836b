//! What the claim page shows for a given state.

use gc_api_types::{ClaimStatus, TokenId, WalletAddress};

use crate::state::ClaimState;

pub const CHECKING_LABEL: &str = "Please Wait...";
pub const CLAIM_LABEL: &str = "Claim Your Gift";
pub const FUNDING_MESSAGE: &str = "Funding your wallet, please wait...";
pub const COMPLETED_MESSAGE: &str = "Your gift is claimed!";

pub const PROGRESS_MESSAGES: [&str; 4] = [
    "Preparing your gift...",
    "Packing your gift...",
    "Adding final touches...",
    "Almost ready...",
];

const PROGRESS_START: u8 = 20;
const PROGRESS_STEP: u8 = 20;

/// Builds marketplace links for minted tokens.
#[derive(Debug, Clone)]
pub struct ViewerLinks {
    base_url: String,
    chain_slug: String,
    contract: WalletAddress,
}

impl ViewerLinks {
    pub fn opensea_base(contract: WalletAddress) -> Self {
        Self {
            base_url: "https://opensea.io".to_owned(),
            chain_slug: "base".to_owned(),
            contract,
        }
    }

    pub fn token(&self, token_id: &TokenId) -> String {
        format!(
            "{}/assets/{}/{}/{}",
            self.base_url, self.chain_slug, self.contract, token_id
        )
    }

    pub fn account(&self, wallet: &WalletAddress) -> String {
        format!("{}/{}", self.base_url, wallet)
    }

    /// Token page when the id is known, otherwise the owner's account page.
    pub fn for_claim(&self, wallet: &WalletAddress, token_id: Option<&TokenId>) -> String {
        match token_id {
            Some(token_id) => self.token(token_id),
            None => self.account(wallet),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimButton {
    Hidden,
    Disabled(&'static str),
    Enabled(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    None,
    Funding(&'static str),
    Minting { percent: u8, message: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub message: &'static str,
    pub viewer_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimView {
    pub button: ClaimButton,
    pub progress: Progress,
    pub completion: Option<Completion>,
}

impl ClaimView {
    pub fn render(
        state: &ClaimState,
        wallet: &WalletAddress,
        bar: &ProgressBar,
        links: &ViewerLinks,
    ) -> Self {
        let button = match state.status {
            ClaimStatus::Checking => ClaimButton::Disabled(CHECKING_LABEL),
            ClaimStatus::NotStarted => ClaimButton::Enabled(CLAIM_LABEL),
            ClaimStatus::Funding | ClaimStatus::InProgress | ClaimStatus::Completed => {
                ClaimButton::Hidden
            }
        };

        let progress = match state.status {
            ClaimStatus::Funding => Progress::Funding(FUNDING_MESSAGE),
            ClaimStatus::InProgress => Progress::Minting {
                percent: bar.percent(),
                message: bar.message(),
            },
            _ => Progress::None,
        };

        let completion = (state.status == ClaimStatus::Completed).then(|| Completion {
            message: COMPLETED_MESSAGE,
            viewer_url: links.for_claim(wallet, state.token_id.as_ref()),
        });

        Self {
            button,
            progress,
            completion,
        }
    }
}

/// Cosmetic progress shown while the mint confirms. It is not tied to chain progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBar {
    percent: u8,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            percent: PROGRESS_START,
        }
    }
}

impl ProgressBar {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn tick(&mut self) {
        self.percent = self.percent.saturating_add(PROGRESS_STEP).min(100);
    }

    pub fn reset(&mut self) {
        self.percent = PROGRESS_START;
    }

    pub fn message(&self) -> &'static str {
        let index = usize::from(self.percent / 25).min(PROGRESS_MESSAGES.len() - 1);
        PROGRESS_MESSAGES[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress([0x11; 20])
    }

    fn links() -> ViewerLinks {
        ViewerLinks::opensea_base(WalletAddress([0xab; 20]))
    }

    fn state(status: ClaimStatus, token_id: Option<&str>) -> ClaimState {
        ClaimState {
            status,
            token_id: token_id.map(|id| TokenId(id.to_owned())),
        }
    }

    fn render(state: &ClaimState) -> ClaimView {
        ClaimView::render(state, &wallet(), &ProgressBar::default(), &links())
    }

    #[test]
    fn button_follows_status() {
        assert_eq!(
            render(&state(ClaimStatus::Checking, None)).button,
            ClaimButton::Disabled("Please Wait...")
        );
        assert_eq!(
            render(&state(ClaimStatus::NotStarted, None)).button,
            ClaimButton::Enabled("Claim Your Gift")
        );
        for status in [ClaimStatus::Funding, ClaimStatus::InProgress, ClaimStatus::Completed] {
            assert_eq!(render(&state(status, None)).button, ClaimButton::Hidden);
        }
    }

    #[test]
    fn funding_then_minting_progress() {
        assert_eq!(
            render(&state(ClaimStatus::Funding, None)).progress,
            Progress::Funding("Funding your wallet, please wait...")
        );
        assert_eq!(
            render(&state(ClaimStatus::InProgress, None)).progress,
            Progress::Minting {
                percent: 20,
                message: "Preparing your gift..."
            }
        );
        assert_eq!(render(&state(ClaimStatus::NotStarted, None)).progress, Progress::None);
    }

    #[test]
    fn progress_bar_steps_and_caps() {
        let mut bar = ProgressBar::default();
        let mut seen = vec![(bar.percent(), bar.message())];
        for _ in 0..6 {
            bar.tick();
            seen.push((bar.percent(), bar.message()));
        }

        assert_eq!(
            seen,
            vec![
                (20, "Preparing your gift..."),
                (40, "Packing your gift..."),
                (60, "Adding final touches..."),
                (80, "Almost ready..."),
                (100, "Almost ready..."),
                (100, "Almost ready..."),
                (100, "Almost ready..."),
            ]
        );

        bar.reset();
        assert_eq!(bar.percent(), 20);
    }

    #[test]
    fn completion_links_to_token_or_account() {
        let with_token = render(&state(ClaimStatus::Completed, Some("42")));
        assert_eq!(
            with_token.completion,
            Some(Completion {
                message: "Your gift is claimed!",
                viewer_url: format!(
                    "https://opensea.io/assets/base/0x{}/42",
                    "ab".repeat(20)
                ),
            })
        );

        let without_token = render(&state(ClaimStatus::Completed, None));
        assert_eq!(
            without_token.completion.map(|c| c.viewer_url),
            Some(format!("https://opensea.io/0x{}", "11".repeat(20)))
        );

        assert!(render(&state(ClaimStatus::NotStarted, None)).completion.is_none());
    }
}
