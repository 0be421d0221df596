use crate::core::record::DNSRecord;
use crate::error::Error;
use async_trait::async_trait;

/// A DNS backend holding the records of one zone.
///
/// `upsert_record` is keyed by `(name, record_type)`. `delete_record` returns
/// `Error::NotFound` when the record is already gone; callers treat that as
/// success. Retrying transient backend failures is the implementation's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DNSProvider: Send + Sync {
    fn kind(&self) -> &'static str;

    /// The TTL this backend ends up reporting for a wanted `ttl`. Backends
    /// that store no TTL, or fold some values into "automatic", override it
    /// so an unchanged record compares equal on the next pass.
    fn effective_ttl(&self, ttl: Option<u32>) -> Option<u32> {
        ttl
    }

    async fn list_records(&self) -> Result<Vec<DNSRecord>, Error>;
    async fn upsert_record(&self, record: DNSRecord) -> Result<(), Error>;
    async fn delete_record(&self, record: DNSRecord) -> Result<(), Error>;
}
