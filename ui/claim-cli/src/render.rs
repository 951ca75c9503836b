use gc_claim_core::{ClaimButton, ClaimView, Progress};

const BAR_WIDTH: usize = 10;

pub fn render_lines(view: &ClaimView) -> Vec<String> {
    let mut lines = Vec::new();

    match view.button {
        ClaimButton::Hidden => {}
        ClaimButton::Disabled(label) => lines.push(format!("[ {label} ]")),
        ClaimButton::Enabled(label) => {
            lines.push(format!("[ {label} ]  run `claim-cli claim` to continue"))
        }
    }

    match view.progress {
        Progress::None => {}
        Progress::Funding(message) => lines.push(message.to_owned()),
        Progress::Minting { percent, message } => lines.push(progress_line(percent, message)),
    }

    if let Some(completion) = &view.completion {
        lines.push(completion.message.to_owned());
        lines.push(format!("View it at {}", completion.viewer_url));
    }

    lines
}

pub fn progress_line(percent: u8, message: &str) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent,
        message
    )
}
