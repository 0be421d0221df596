use crate::error::Error;
use crate::providers::nextdns::types::NextDNSError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NextDNSProviderError {
    #[error("NextDNS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NextDNS rejected the API key: {0}")]
    Credential(String),

    #[error("NextDNS rewrite not found: {0}")]
    NotFound(String),

    #[error("NextDNS rejected the rewrite: {0}")]
    InvalidInput(String),

    #[error("NextDNS API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("NextDNS still rate limiting after {attempts} attempts")]
    RateLimited { attempts: u32 },
}

impl From<NextDNSError> for NextDNSProviderError {
    fn from(err: NextDNSError) -> Self {
        let message = err.detail.unwrap_or_else(|| err.code.clone());
        match err.code.as_str() {
            "notFound" => Self::NotFound(message),
            "invalid" | "duplicate" => Self::InvalidInput(message),
            "unauthorized" | "forbidden" => Self::Credential(message),
            "rateLimited" => Self::RateLimited { attempts: 1 },
            _ => Self::Api {
                code: err.code,
                message,
            },
        }
    }
}

pub fn map_error(e: NextDNSProviderError) -> Error {
    let text = e.to_string();
    match e {
        NextDNSProviderError::Credential(_) => Error::CredentialError(text),
        NextDNSProviderError::NotFound(_) => Error::NotFound(text),
        NextDNSProviderError::InvalidInput(_) => Error::InvalidInput(text),
        NextDNSProviderError::Http(_)
        | NextDNSProviderError::Api { .. }
        | NextDNSProviderError::RateLimited { .. } => Error::ProviderError(text),
    }
}
