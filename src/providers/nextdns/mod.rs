//! NextDNS provider implementation

pub mod client;
pub mod error;
pub mod types;


pub use client::{NextDNSConfig, NextDNSProvider};
pub use types::NextDNSRecord;
// --- DNSProvider trait implementation for NextDNSProvider ---
use crate::core::provider::DNSProvider;
use crate::core::record::DNSRecord;
use crate::error::Error;
use async_trait::async_trait;
use error::map_error;
use types::{UpdateRecordRequest, to_dns_record, to_nextdns_record};

impl NextDNSProvider {
    /// Rewrites managed by this tool, i.e. those pointing at an address.
    async fn managed_rewrites(&self) -> Result<Vec<(NextDNSRecord, DNSRecord)>, Error> {
        let rewrites = self.list_rewrites().await.map_err(map_error)?;
        Ok(rewrites
            .into_iter()
            .filter_map(|r| to_dns_record(&r).map(|d| (r, d)))
            .collect())
    }
}

#[async_trait]
impl DNSProvider for NextDNSProvider {
    fn kind(&self) -> &'static str {
        "nextdns"
    }

    /// Rewrites carry no TTL.
    fn effective_ttl(&self, _ttl: Option<u32>) -> Option<u32> {
        None
    }

    async fn list_records(&self) -> Result<Vec<DNSRecord>, Error> {
        Ok(self
            .managed_rewrites()
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    async fn upsert_record(&self, record: DNSRecord) -> Result<(), Error> {
        // NextDNS needs the rewrite id, so we must fetch all and match
        let rewrites = self.managed_rewrites().await?;
        let existing = rewrites
            .iter()
            .find(|(_, r)| r.name == record.name && r.record_type == record.record_type);

        match existing {
            Some((_, current)) if current.value == record.value => Ok(()),
            Some((rewrite, _)) => {
                let req = UpdateRecordRequest {
                    content: record.value.clone(),
                };
                self.update_rewrite(&rewrite.id, &req)
                    .await
                    .map_err(map_error)
            }
            None => self
                .create_rewrite(&to_nextdns_record(&record))
                .await
                .map_err(map_error),
        }
    }

    async fn delete_record(&self, record: DNSRecord) -> Result<(), Error> {
        let rewrites = self.managed_rewrites().await?;
        let Some((rewrite, _)) = rewrites.iter().find(|(_, r)| {
            r.name == record.name
                && r.record_type == record.record_type
                && r.value == record.value
        }) else {
            return Err(Error::NotFound(format!(
                "{} {} {}",
                record.record_type, record.name, record.value
            )));
        };
        self.delete_rewrite(&rewrite.id).await.map_err(map_error)
    }
}
