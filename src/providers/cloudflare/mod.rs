//! Cloudflare provider implementation

pub mod client;
pub mod error;
pub mod types;

pub use client::{CloudflareConfig, CloudflareProvider};

use crate::core::provider::DNSProvider;
use crate::core::record::DNSRecord;
use crate::error::Error;
use async_trait::async_trait;
use error::map_error;
use types::{AUTO_TTL, CloudflareRecord, UpdateRecordRequest, to_cloudflare_record, to_dns_record};

impl CloudflareProvider {
    async fn managed_records(&self) -> Result<Vec<(CloudflareRecord, DNSRecord)>, Error> {
        let records = self.list_dns_records().await.map_err(map_error)?;
        Ok(records
            .into_iter()
            .filter_map(|r| to_dns_record(&r).map(|d| (r, d)))
            .collect())
    }
}

#[async_trait]
impl DNSProvider for CloudflareProvider {
    fn kind(&self) -> &'static str {
        "cloudflare"
    }

    fn effective_ttl(&self, ttl: Option<u32>) -> Option<u32> {
        ttl.filter(|t| *t != AUTO_TTL)
    }

    async fn list_records(&self) -> Result<Vec<DNSRecord>, Error> {
        Ok(self
            .managed_records()
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    async fn upsert_record(&self, record: DNSRecord) -> Result<(), Error> {
        let record = DNSRecord {
            ttl: self.effective_ttl(record.ttl),
            ..record
        };
        let records = self.managed_records().await?;
        let existing = records
            .iter()
            .find(|(_, r)| r.name == record.name && r.record_type == record.record_type);

        match existing {
            Some((_, current)) if current == &record => Ok(()),
            Some((cf, _)) => {
                let req = UpdateRecordRequest {
                    content: record.value.clone(),
                    ttl: record.ttl.unwrap_or(AUTO_TTL),
                };
                self.update_dns_record(&cf.id, &req).await.map_err(map_error)
            }
            None => self
                .create_dns_record(&to_cloudflare_record(&record))
                .await
                .map_err(map_error),
        }
    }

    async fn delete_record(&self, record: DNSRecord) -> Result<(), Error> {
        let records = self.managed_records().await?;
        let Some((cf, _)) = records.iter().find(|(_, r)| {
            r.name == record.name
                && r.record_type == record.record_type
                && r.value == record.value
        }) else {
            return Err(Error::NotFound(format!(
                "{} {} {}",
                record.record_type, record.name, record.value
            )));
        };
        self.delete_dns_record(&cf.id).await.map_err(map_error)
    }
}
