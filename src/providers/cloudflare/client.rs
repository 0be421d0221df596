use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::auth::credentials::CredentialManager;
use crate::providers::cloudflare::error::CloudflareError;
use crate::providers::cloudflare::types::*;

const PER_PAGE: u32 = 100;

pub struct CloudflareConfig {
    pub zone_id: String,
    pub api_url: String,
}

pub struct CloudflareProvider {
    config: CloudflareConfig,
    client: Client,
}

impl CloudflareProvider {
    pub fn new(
        config: CloudflareConfig,
        credentials: &dyn CredentialManager,
    ) -> Result<Self, CloudflareError> {
        let token = credentials
            .get("api_token")
            .map_err(|e| CloudflareError::Credential(e.to_string()))?;
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| CloudflareError::Credential(e.to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { config, client })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/zones/{}/dns_records",
            self.config.api_url, self.config.zone_id
        )
    }

    async fn parse<T: DeserializeOwned>(
        response: Response,
    ) -> Result<CloudflareResponse<T>, CloudflareError> {
        let status = response.status();
        let body: Option<CloudflareResponse<T>> = response.json().await.ok();
        match body {
            Some(body) if status.is_success() && body.success => Ok(body),
            _ if status == StatusCode::NOT_FOUND => {
                Err(CloudflareError::NotFound(status.to_string()))
            }
            Some(body) => Err(CloudflareError::Api {
                status: status.as_u16(),
                message: body
                    .errors
                    .iter()
                    .map(|e| format!("{} ({})", e.message, e.code))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
            None => Err(CloudflareError::Api {
                status: status.as_u16(),
                message: String::from("unreadable response body"),
            }),
        }
    }

    /// Every record of the zone, following pagination.
    pub async fn list_dns_records(&self) -> Result<Vec<CloudflareRecord>, CloudflareError> {
        let url = self.records_url();
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", PER_PAGE)])
                .send()
                .await?;
            let body: CloudflareResponse<Vec<CloudflareRecord>> = Self::parse(response).await?;
            records.extend(body.result.unwrap_or_default());

            match body.result_info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => break,
            }
        }
        Ok(records)
    }

    pub async fn create_dns_record(&self, req: &CreateRecordRequest) -> Result<(), CloudflareError> {
        let response = self.client.post(self.records_url()).json(req).send().await?;
        Self::parse::<CloudflareRecord>(response).await?;
        Ok(())
    }

    pub async fn update_dns_record(
        &self,
        id: &str,
        req: &UpdateRecordRequest,
    ) -> Result<(), CloudflareError> {
        let url = format!("{}/{}", self.records_url(), id);
        let response = self.client.patch(url).json(req).send().await?;
        Self::parse::<CloudflareRecord>(response).await?;
        Ok(())
    }

    pub async fn delete_dns_record(&self, id: &str) -> Result<(), CloudflareError> {
        let url = format!("{}/{}", self.records_url(), id);
        let response = self.client.delete(url).send().await?;
        Self::parse::<serde_json::Value>(response).await?;
        Ok(())
    }
}
