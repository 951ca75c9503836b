use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("wallet provisioning failed")]
    Provision(#[source] anyhow::Error),
    #[error("prior claim lookup failed")]
    StatusQuery(#[source] anyhow::Error),
    #[error("funding failed")]
    Funding(#[source] anyhow::Error),
    #[error("minting failed")]
    Mint(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::error::Error as _;

    #[test]
    fn cause_is_reported_once_through_the_source_chain() {
        let err = ClaimError::Funding(anyhow!("connection reset"));

        assert_eq!(err.to_string(), "funding failed");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("connection reset")
        );

        let chained = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chained.matches("connection reset").count(), 1);
    }
}
