use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use crate::auth::credentials::CredentialManager;
use crate::providers::nextdns::error::NextDNSProviderError;
use crate::providers::nextdns::types::*;

const MAX_ATTEMPTS: u32 = 3;

pub struct NextDNSConfig {
    pub profile_id: String,
    pub api_url: String,
    /// Minimum spacing between two API requests.
    pub min_delay: Duration,
}

pub struct NextDNSProvider {
    config: NextDNSConfig,
    client: Client,
    rate_limiter: RateLimiter,
}

#[derive(Clone)]
struct RateLimiter {
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(*last);

        if elapsed < self.min_delay {
            tokio::time::sleep(self.min_delay - elapsed).await;
        }

        *last = Instant::now();
    }
}

impl NextDNSProvider {
    pub fn new(
        config: NextDNSConfig,
        credentials: &dyn CredentialManager,
    ) -> Result<Self, NextDNSProviderError> {
        let api_key = credentials
            .get("api_key")
            .map_err(|e| NextDNSProviderError::Credential(e.to_string()))?;
        let mut key = HeaderValue::from_str(&api_key)
            .map_err(|e| NextDNSProviderError::Credential(e.to_string()))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let rate_limiter = RateLimiter {
            last_request: Arc::new(Mutex::new(
                Instant::now()
                    .checked_sub(config.min_delay)
                    .unwrap_or_else(Instant::now),
            )),
            min_delay: config.min_delay,
        };

        Ok(Self {
            config,
            client,
            rate_limiter,
        })
    }

    fn rewrites_url(&self) -> String {
        format!(
            "{}/profiles/{}/rewrites",
            self.config.api_url, self.config.profile_id
        )
    }

    /// Sends the request built by `build`, retrying while NextDNS answers
    /// 429 and honouring its Retry-After.
    async fn send<F>(&self, build: F) -> Result<Response, NextDNSProviderError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            self.rate_limiter.wait().await;
            let response = build().send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            if attempt >= MAX_ATTEMPTS {
                return Err(NextDNSProviderError::RateLimited { attempts: attempt });
            }
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(5);
            warn!(attempt, retry_after, "NextDNS rate limit hit, backing off");
            tokio::time::sleep(Duration::from_secs(retry_after)).await;
            attempt += 1;
        }
    }

    async fn expect_success(response: Response) -> Result<Response, NextDNSProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: ErrorResponse = response.json().await.unwrap_or_default();
        match body.errors.into_iter().next() {
            Some(error) => Err(error.into()),
            None if status == StatusCode::NOT_FOUND => {
                Err(NextDNSProviderError::NotFound(status.to_string()))
            }
            None if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                Err(NextDNSProviderError::Credential(status.to_string()))
            }
            None => Err(NextDNSProviderError::Api {
                code: status.as_u16().to_string(),
                message: status.to_string(),
            }),
        }
    }

    pub async fn list_rewrites(&self) -> Result<Vec<NextDNSRecord>, NextDNSProviderError> {
        let url = self.rewrites_url();
        let response = self.send(|| self.client.get(&url)).await?;
        let list: RewriteList = Self::expect_success(response).await?.json().await?;
        Ok(list.data)
    }

    pub async fn create_rewrite(&self, req: &CreateRecordRequest) -> Result<(), NextDNSProviderError> {
        let url = self.rewrites_url();
        let response = self.send(|| self.client.post(&url).json(req)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn update_rewrite(
        &self,
        id: &str,
        req: &UpdateRecordRequest,
    ) -> Result<(), NextDNSProviderError> {
        let url = format!("{}/{}", self.rewrites_url(), id);
        let response = self.send(|| self.client.patch(&url).json(req)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn delete_rewrite(&self, id: &str) -> Result<(), NextDNSProviderError> {
        let url = format!("{}/{}", self.rewrites_url(), id);
        let response = self.send(|| self.client.delete(&url)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}
