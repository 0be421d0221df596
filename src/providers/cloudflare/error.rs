use thiserror::Error;

use crate::error::Error;

#[derive(Error, Debug)]
pub enum CloudflareError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cloudflare API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub fn map_error(e: CloudflareError) -> Error {
    match e {
        CloudflareError::Http(err) => Error::ProviderError(err.to_string()),
        CloudflareError::Credential(msg) => Error::CredentialError(msg),
        CloudflareError::NotFound(msg) => Error::NotFound(msg),
        CloudflareError::Api { status: 400, message } => Error::InvalidInput(message),
        CloudflareError::Api { status: 401 | 403, message } => Error::CredentialError(message),
        e @ CloudflareError::Api { .. } => Error::ProviderError(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_map_error_variants() {
        assert_matches!(
            map_error(CloudflareError::NotFound("x".into())),
            Error::NotFound(_)
        );
        assert_matches!(
            map_error(CloudflareError::Api {
                status: 403,
                message: "denied".into()
            }),
            Error::CredentialError(m) if m == "denied"
        );
        assert_matches!(
            map_error(CloudflareError::Api {
                status: 400,
                message: "bad".into()
            }),
            Error::InvalidInput(_)
        );
        assert_matches!(
            map_error(CloudflareError::Api {
                status: 502,
                message: "gateway".into()
            }),
            Error::ProviderError(m) if m.contains("502")
        );
    }
}
