use crate::auth::credentials::Secret;
use crate::core::record::{DNSRecordType, normalize_name};
use crate::desired::DomainRecord;
use crate::error::Error;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";
pub const NEXTDNS_API_URL: &str = "https://api.nextdns.io";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Seconds between reconciliation passes.
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub domains: Vec<DomainRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "yes")]
    pub enable_ipv4: bool,
    #[serde(default)]
    pub enable_ipv6: bool,
    /// Delete records of managed types that no desired domain names.
    #[serde(default)]
    pub purge_unknown: bool,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            enable_ipv4: true,
            enable_ipv6: false,
            purge_unknown: false,
        }
    }
}

impl DnsConfig {
    pub fn is_enabled(&self, record_type: DNSRecordType) -> bool {
        match record_type {
            DNSRecordType::A => self.enable_ipv4,
            DNSRecordType::AAAA => self.enable_ipv6,
        }
    }

    pub fn enabled_types(&self) -> impl Iterator<Item = DNSRecordType> + '_ {
        DNSRecordType::ALL
            .into_iter()
            .filter(|t| self.is_enabled(*t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Simple,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Read domain records from labels of running containers.
    #[serde(default = "yes")]
    pub docker: bool,
    /// Fall back to Traefik `Host(...)` router rules when no name label is set.
    #[serde(default)]
    pub traefik: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            docker: true,
            traefik: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpLookupConfig {
    #[serde(default = "default_ipv4_url")]
    pub ipv4_url: String,
    #[serde(default = "default_ipv6_url")]
    pub ipv6_url: String,
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            ipv4_url: default_ipv4_url(),
            ipv6_url: default_ipv6_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    #[serde(flatten)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub credentials: HashMap<String, Secret>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    Cloudflare {
        zone_id: String,
        #[serde(default = "default_cloudflare_url")]
        api_url: String,
    },
    NextDns {
        profile_id: String,
        #[serde(default = "default_nextdns_url")]
        api_url: String,
    },
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Error> {
        let mut config: AppConfig =
            serde_yaml::from_str(raw).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    fn normalize(&mut self) {
        for zone in &mut self.zones {
            zone.name = normalize_name(&zone.name);
        }
        for domain in &mut self.domains {
            domain.name = normalize_name(&domain.name);
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.zones.is_empty() {
            return Err(Error::ConfigError("no zone configuration found".into()));
        }
        if self.interval == 0 {
            return Err(Error::ConfigError("interval must be at least 1 second".into()));
        }
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.name.is_empty() {
                return Err(Error::ConfigError("zone with empty name".into()));
            }
            if !seen.insert(zone.name.as_str()) {
                return Err(Error::ConfigError(format!(
                    "zone {} is configured more than once",
                    zone.name
                )));
            }
        }
        if let Some(domain) = self.domains.iter().find(|d| d.name.is_empty()) {
            return Err(Error::ConfigError(format!(
                "domain entry with empty name: {domain:?}"
            )));
        }
        Ok(())
    }
}

fn yes() -> bool {
    true
}

fn default_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_ipv4_url() -> String {
    String::from("https://api.ipify.org")
}

fn default_ipv6_url() -> String {
    String::from("https://api6.ipify.org")
}

fn default_cloudflare_url() -> String {
    String::from(CLOUDFLARE_API_URL)
}

fn default_nextdns_url() -> String {
    String::from(NEXTDNS_API_URL)
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    impl Default for AppConfig {
        fn default() -> Self {
            AppConfig {
                interval: 300,
                log: LogConfig::default(),
                http: HttpConfig::default(),
                dns: DnsConfig::default(),
                discovery: DiscoveryConfig {
                    docker: false,
                    traefik: false,
                },
                ip_lookup: IpLookupConfig::default(),
                zones: vec![ZoneConfig {
                    name: String::from("example.com"),
                    provider: ProviderConfig::Cloudflare {
                        zone_id: String::from("zone-id"),
                        api_url: String::from("http://127.0.0.1:1"),
                    },
                    credentials: HashMap::from([(
                        String::from("api_token"),
                        Secret::Value(String::from("token")),
                    )]),
                }],
                domains: vec![],
            }
        }
    }
}
