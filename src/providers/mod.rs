//! Concrete DNS backends, chosen per zone by configuration.

pub mod cloudflare;
pub mod nextdns;

use crate::auth::credentials::ZoneCredentials;
use crate::config::{ProviderConfig, ZoneConfig};
use crate::core::provider::DNSProvider;
use crate::error::Error;
use std::time::Duration;

/// Spacing NextDNS tolerates between API calls.
const NEXTDNS_MIN_DELAY: Duration = Duration::from_millis(500);

pub fn build(zone: &ZoneConfig) -> Result<Box<dyn DNSProvider>, Error> {
    let credentials = ZoneCredentials::new(&zone.name, zone.credentials.clone());
    match &zone.provider {
        ProviderConfig::Cloudflare { zone_id, api_url } => {
            let config = cloudflare::CloudflareConfig {
                zone_id: zone_id.clone(),
                api_url: api_url.trim_end_matches('/').to_string(),
            };
            let provider = cloudflare::CloudflareProvider::new(config, &credentials)
                .map_err(cloudflare::error::map_error)?;
            Ok(Box::new(provider))
        }
        ProviderConfig::NextDns {
            profile_id,
            api_url,
        } => {
            let config = nextdns::NextDNSConfig {
                profile_id: profile_id.clone(),
                api_url: api_url.trim_end_matches('/').to_string(),
                min_delay: NEXTDNS_MIN_DELAY,
            };
            let provider = nextdns::NextDNSProvider::new(config, &credentials)
                .map_err(nextdns::error::map_error)?;
            Ok(Box::new(provider))
        }
    }
}
