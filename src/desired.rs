//! Desired state: what each zone should contain this pass.

use crate::core::record::{DNSRecordType, normalize_name};
use crate::core::registry::zone_for;
use crate::error::Error;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Static,
    Discovered,
}

/// A domain that should resolve to this host (or to the given addresses).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainRecord {
    pub name: String,
    #[serde(default)]
    pub a: Option<Ipv4Addr>,
    #[serde(default)]
    pub aaaa: Option<Ipv6Addr>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(skip)]
    pub source: Source,
}

impl DomainRecord {
    pub fn new(name: &str, source: Source) -> Self {
        Self {
            name: normalize_name(name),
            a: None,
            aaaa: None,
            ttl: None,
            source,
        }
    }

    /// The fixed answer for `record_type`, if one was given.
    pub fn explicit_value(&self, record_type: DNSRecordType) -> Option<String> {
        match record_type {
            DNSRecordType::A => self.a.map(|ip| ip.to_string()),
            DNSRecordType::AAAA => self.aaaa.map(|ip| ip.to_string()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn discover(&self) -> Result<Vec<DomainRecord>, Error>;
}

pub struct DesiredStateResolver {
    static_domains: Vec<DomainRecord>,
    discovery: Option<Box<dyn DiscoverySource>>,
}

impl DesiredStateResolver {
    pub fn new(
        static_domains: Vec<DomainRecord>,
        discovery: Option<Box<dyn DiscoverySource>>,
    ) -> Self {
        let static_domains = static_domains
            .into_iter()
            .map(|mut d| {
                d.name = normalize_name(&d.name);
                d.source = Source::Static;
                d
            })
            .collect();
        Self {
            static_domains,
            discovery,
        }
    }

    /// Builds the desired domains of every zone. Each zone gets an entry,
    /// even when nothing is wanted there, so its records can still be purged.
    pub async fn resolve(&self, zones: &[String]) -> BTreeMap<String, Vec<DomainRecord>> {
        let discovered = match &self.discovery {
            Some(source) => match source.discover().await {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "discovery unavailable, using static domains only");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut desired: BTreeMap<String, Vec<DomainRecord>> = zones
            .iter()
            .map(|zone| (zone.clone(), Vec::new()))
            .collect();

        for domain in merge(&self.static_domains, discovered) {
            let Some(zone) = zone_for(zones, &domain.name) else {
                warn!(name = %domain.name, "domain does not belong to any configured zone");
                continue;
            };
            if let Some(entries) = desired.get_mut(zone) {
                entries.push(domain);
            }
        }
        desired
    }
}

/// Static domains shadow discovered ones with the same name; among
/// discovered duplicates the first one wins.
fn merge(static_domains: &[DomainRecord], discovered: Vec<DomainRecord>) -> Vec<DomainRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(static_domains.len() + discovered.len());

    for domain in static_domains {
        if seen.insert(domain.name.clone()) {
            merged.push(domain.clone());
        }
    }
    for mut domain in discovered {
        domain.name = normalize_name(&domain.name);
        domain.source = Source::Discovered;
        if seen.contains(&domain.name) {
            debug!(name = %domain.name, "discovered domain shadowed by existing entry");
            continue;
        }
        seen.insert(domain.name.clone());
        merged.push(domain);
    }
    merged
}
