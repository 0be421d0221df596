use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Discovery error: {0}")]
    DiscoveryError(String),

    #[error("Address lookup error: {0}")]
    LookupError(String),
}

impl Error {
    /// Deleting or updating something that is already gone is not a failure
    /// for an idempotent caller.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            Error::ProviderError("boom".into()).to_string(),
            "Provider error: boom"
        );
        assert_eq!(
            Error::ConfigError("no zones".into()).to_string(),
            "Configuration error: no zones"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::ProviderError("x".into()).is_not_found());
    }
}
