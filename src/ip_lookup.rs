use crate::config::IpLookupConfig;
use crate::core::record::DNSRecordType;
use crate::error::Error;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{error, info};

/// Finds the public address of this host for one address family.
#[async_trait]
pub trait IpLookup: Send + Sync {
    async fn lookup(&self, record_type: DNSRecordType) -> Result<String, Error>;
}

/// Asks a plain-text "what is my IP" service, one URL per family.
pub struct HttpIpLookup {
    client: Client,
    ipv4_url: String,
    ipv6_url: String,
}

impl HttpIpLookup {
    pub fn new(config: &IpLookupConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::LookupError(e.to_string()))?;
        Ok(Self {
            client,
            ipv4_url: config.ipv4_url.clone(),
            ipv6_url: config.ipv6_url.clone(),
        })
    }
}

#[async_trait]
impl IpLookup for HttpIpLookup {
    async fn lookup(&self, record_type: DNSRecordType) -> Result<String, Error> {
        let url = match record_type {
            DNSRecordType::A => &self.ipv4_url,
            DNSRecordType::AAAA => &self.ipv6_url,
        };
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::LookupError(e.to_string()))?
            .text()
            .await
            .map_err(|e| Error::LookupError(e.to_string()))?;

        let address = body.trim();
        let valid = match record_type {
            DNSRecordType::A => address.parse::<Ipv4Addr>().is_ok(),
            DNSRecordType::AAAA => address.parse::<Ipv6Addr>().is_ok(),
        };
        if !valid {
            return Err(Error::LookupError(format!(
                "{url} returned '{address}', not an {record_type} address"
            )));
        }
        Ok(address.to_string())
    }
}

/// Public addresses for the duration of one pass. Failures are remembered
/// too, so a dead lookup service is asked once per pass rather than once
/// per record.
pub struct AddressCache<'a> {
    lookup: &'a dyn IpLookup,
    resolved: HashMap<DNSRecordType, Option<String>>,
}

impl<'a> AddressCache<'a> {
    pub fn new(lookup: &'a dyn IpLookup) -> Self {
        Self {
            lookup,
            resolved: HashMap::new(),
        }
    }

    pub async fn get(&mut self, record_type: DNSRecordType) -> Option<String> {
        if let Some(known) = self.resolved.get(&record_type) {
            return known.clone();
        }
        let address = match self.lookup.lookup(record_type).await {
            Ok(address) => {
                info!(%record_type, %address, "resolved public address");
                Some(address)
            }
            Err(e) => {
                error!(%record_type, error = %e, "couldn't look up public address");
                None
            }
        };
        self.resolved.insert(record_type, address.clone());
        address
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct MockIpLookup {
        pub ipv4: Option<String>,
        pub ipv6: Option<String>,
        pub calls: AtomicUsize,
    }

    impl MockIpLookup {
        pub fn new() -> Self {
            Self {
                ipv4: None,
                ipv6: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set_ip(&mut self, ip: &str) {
            self.ipv4 = Some(ip.to_string());
        }

        pub fn set_ipv6(&mut self, ip: &str) {
            self.ipv6 = Some(ip.to_string());
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IpLookup for MockIpLookup {
        async fn lookup(&self, record_type: DNSRecordType) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ip = match record_type {
                DNSRecordType::A => self.ipv4.clone(),
                DNSRecordType::AAAA => self.ipv6.clone(),
            };
            ip.ok_or_else(|| Error::LookupError("no address".into()))
        }
    }
}
