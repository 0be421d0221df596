//! Converges one zone towards its desired domains.
//!
//! A pass is always sync first, purge second. The purge predicate only looks
//! at name and type, so a still-wanted record with a stale value survives
//! purge; it is the sync step that has already rewritten that value.

use crate::config::DnsConfig;
use crate::core::provider::DNSProvider;
use crate::core::record::DNSRecord;
use crate::desired::DomainRecord;
use crate::ip_lookup::AddressCache;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Counters for one zone pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZoneReport {
    pub upserted: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
    /// Records with no target value (public address unknown).
    pub skipped: usize,
    /// `List` failed, so nothing could be compared.
    pub aborted: bool,
}

impl fmt::Display for ZoneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "upserted={} unchanged={} deleted={} failed={} skipped={}",
            self.upserted, self.unchanged, self.deleted, self.failed, self.skipped
        )
    }
}

pub struct Reconciler {
    dns: DnsConfig,
}

impl Reconciler {
    pub fn new(dns: DnsConfig) -> Self {
        Self { dns }
    }

    pub async fn reconcile(
        &self,
        zone: &str,
        provider: &dyn DNSProvider,
        desired: &[DomainRecord],
        addresses: &mut AddressCache<'_>,
    ) -> ZoneReport {
        let mut report = ZoneReport::default();

        self.sync_records(provider, desired, addresses, &mut report)
            .await;
        if report.aborted {
            return report;
        }

        if self.dns.purge_unknown {
            self.purge_unknown_records(provider, desired, &mut report)
                .await;
        }

        info!(zone, %report, "zone reconciled");
        report
    }

    async fn sync_records(
        &self,
        provider: &dyn DNSProvider,
        desired: &[DomainRecord],
        addresses: &mut AddressCache<'_>,
        report: &mut ZoneReport,
    ) {
        let existing = match provider.list_records().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "failed to fetch existing records, skipping zone");
                report.aborted = true;
                return;
            }
        };

        for domain in desired {
            let ttl = provider.effective_ttl(domain.ttl);
            for record_type in self.dns.enabled_types() {
                let value = match domain.explicit_value(record_type) {
                    Some(value) => value,
                    None => match addresses.get(record_type).await {
                        Some(value) => value,
                        None => {
                            warn!(name = %domain.name, %record_type, "no address to publish, skipping");
                            report.skipped += 1;
                            continue;
                        }
                    },
                };

                if existing
                    .iter()
                    .any(|r| r.matches(&domain.name, record_type, &value, ttl))
                {
                    debug!(name = %domain.name, %record_type, %value, "record up to date");
                    report.unchanged += 1;
                    continue;
                }

                let record = DNSRecord::new(record_type, &domain.name, value, ttl);
                match provider.upsert_record(record.clone()).await {
                    Ok(()) => {
                        info!(name = %record.name, %record_type, value = %record.value, "record updated");
                        report.upserted += 1;
                    }
                    Err(e) => {
                        error!(name = %record.name, %record_type, error = %e, "failed to update record");
                        report.failed += 1;
                    }
                }
            }
        }
    }

    async fn purge_unknown_records(
        &self,
        provider: &dyn DNSProvider,
        desired: &[DomainRecord],
        report: &mut ZoneReport,
    ) {
        // Never purge on data we could not read.
        let existing = match provider.list_records().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "failed to fetch existing records, skipping purge");
                return;
            }
        };

        for record in existing {
            if contains_record(desired, &record, &self.dns) {
                continue;
            }
            let (name, record_type) = (record.name.clone(), record.record_type);
            match provider.delete_record(record).await {
                Ok(()) => {
                    info!(%name, %record_type, "purged unknown record");
                    report.deleted += 1;
                }
                Err(e) if e.is_not_found() => {
                    debug!(%name, %record_type, "record already gone");
                }
                Err(e) => {
                    error!(%name, %record_type, error = %e, "failed to purge record");
                    report.failed += 1;
                }
            }
        }
    }
}

/// Whether `record` is still wanted: some desired domain has its name and
/// its type is enabled. The value is deliberately not compared.
pub fn contains_record(desired: &[DomainRecord], record: &DNSRecord, dns: &DnsConfig) -> bool {
    dns.is_enabled(record.record_type)
        && desired.iter().any(|domain| domain.name == record.name)
}
