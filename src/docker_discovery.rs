use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::ListContainersOptions;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

use crate::desired::{DiscoverySource, DomainRecord, Source};
use crate::error::Error;

pub const LABEL_NAME: &str = "dnssync.name";
pub const LABEL_A: &str = "dnssync.a";
pub const LABEL_AAAA: &str = "dnssync.aaaa";
pub const LABEL_TTL: &str = "dnssync.ttl";

/// Reads domain records from the labels of running containers.
pub struct DockerDiscovery {
    docker: Docker,
    traefik: bool,
}

impl DockerDiscovery {
    pub fn new(traefik: bool) -> Result<Self, Error> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::DiscoveryError(e.to_string()))?;
        Ok(Self { docker, traefik })
    }
}

#[async_trait]
impl DiscoverySource for DockerDiscovery {
    async fn discover(&self) -> Result<Vec<DomainRecord>, Error> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(|e| Error::DiscoveryError(e.to_string()))?;

        let mut records = Vec::new();
        for container in containers {
            let Some(labels) = container.labels else {
                continue;
            };
            let name = container
                .names
                .as_ref()
                .and_then(|names| names.first())
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default();
            records.extend(records_from_labels(&name, &labels, self.traefik));
        }
        debug!(count = records.len(), "discovered domain records");
        Ok(records)
    }
}

/// Turns one container's labels into domain records. A container with a
/// malformed address or TTL label contributes nothing.
pub fn records_from_labels(
    container: &str,
    labels: &HashMap<String, String>,
    traefik: bool,
) -> Vec<DomainRecord> {
    let names: Vec<String> = match labels.get(LABEL_NAME) {
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
        None if traefik => traefik_hosts(labels),
        None => return Vec::new(),
    };
    if names.is_empty() {
        return Vec::new();
    }

    let a = match labels.get(LABEL_A).map(|v| v.trim().parse::<Ipv4Addr>()) {
        Some(Ok(ip)) => Some(ip),
        Some(Err(e)) => {
            warn!(container, label = LABEL_A, error = %e, "invalid address label, skipping container");
            return Vec::new();
        }
        None => None,
    };
    let aaaa = match labels.get(LABEL_AAAA).map(|v| v.trim().parse::<Ipv6Addr>()) {
        Some(Ok(ip)) => Some(ip),
        Some(Err(e)) => {
            warn!(container, label = LABEL_AAAA, error = %e, "invalid address label, skipping container");
            return Vec::new();
        }
        None => None,
    };
    let ttl = match labels.get(LABEL_TTL).map(|v| v.trim().parse::<u32>()) {
        Some(Ok(ttl)) => Some(ttl),
        Some(Err(e)) => {
            warn!(container, label = LABEL_TTL, error = %e, "invalid ttl label, skipping container");
            return Vec::new();
        }
        None => None,
    };

    names
        .iter()
        .map(|name| DomainRecord {
            a,
            aaaa,
            ttl,
            ..DomainRecord::new(name, Source::Discovered)
        })
        .collect()
}

/// Hostnames from Traefik router rules, only when Traefik is enabled on the
/// container. `Host(`a`) || Host(`b`, `c`)` yields a, b and c.
fn traefik_hosts(labels: &HashMap<String, String>) -> Vec<String> {
    let traefik_enabled = labels
        .iter()
        .any(|(key, value)| key == "traefik.enable" && value == "true");
    if !traefik_enabled {
        return Vec::new();
    }

    let mut hosts: Vec<String> = labels
        .iter()
        .filter(|(key, _)| key.starts_with("traefik.http.routers.") && key.ends_with(".rule"))
        .flat_map(|(_, rule)| hosts_in_rule(rule))
        .collect();
    hosts.sort();
    hosts.dedup();
    hosts
}

fn hosts_in_rule(rule: &str) -> Vec<String> {
    let mut hosts = Vec::new();
    let mut rest = rule;
    while let Some(start) = rest.find("Host(") {
        let after = &rest[start + "Host(".len()..];
        let Some(end) = after.find(')') else {
            break;
        };
        // Extract content between backticks: Host(`example.com`) -> example.com
        hosts.extend(
            after[..end]
                .split('`')
                .skip(1)
                .step_by(2)
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
        );
        rest = &after[end..];
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_name_label_with_addresses() {
        let records = records_from_labels(
            "web",
            &labels(&[
                (LABEL_NAME, "web.example.com, WWW.example.com"),
                (LABEL_A, "203.0.113.5"),
                (LABEL_AAAA, "2001:db8::5"),
                (LABEL_TTL, "120"),
            ]),
            false,
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "web.example.com");
        assert_eq!(records[1].name, "www.example.com");
        for r in &records {
            assert_eq!(r.source, Source::Discovered);
            assert_eq!(r.a, Some("203.0.113.5".parse().unwrap()));
            assert_eq!(r.aaaa, Some("2001:db8::5".parse().unwrap()));
            assert_eq!(r.ttl, Some(120));
        }
    }

    #[test]
    fn test_no_labels_means_no_records() {
        assert!(records_from_labels("db", &labels(&[("com.example.role", "db")]), true).is_empty());
    }

    #[test]
    fn test_invalid_address_skips_container() {
        let records = records_from_labels(
            "web",
            &labels(&[(LABEL_NAME, "web.example.com"), (LABEL_A, "not-an-ip")]),
            false,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_ttl_skips_container() {
        let records = records_from_labels(
            "web",
            &labels(&[(LABEL_NAME, "web.example.com"), (LABEL_TTL, "soon")]),
            false,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_traefik_fallback() {
        let traefik = labels(&[
            ("traefik.enable", "true"),
            (
                "traefik.http.routers.app.rule",
                "Host(`app.example.com`) || Host(`b.example.com`, `c.example.com`)",
            ),
            ("traefik.http.routers.app.entrypoints", "websecure"),
        ]);

        let records = records_from_labels("app", &traefik, true);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["app.example.com", "b.example.com", "c.example.com"]);

        assert!(records_from_labels("app", &traefik, false).is_empty());
    }

    #[test]
    fn test_traefik_disabled_container() {
        let traefik = labels(&[
            ("traefik.enable", "false"),
            ("traefik.http.routers.app.rule", "Host(`app.example.com`)"),
        ]);
        assert!(records_from_labels("app", &traefik, true).is_empty());
    }

    #[test]
    fn test_name_label_wins_over_traefik() {
        let records = records_from_labels(
            "app",
            &labels(&[
                (LABEL_NAME, "explicit.example.com"),
                ("traefik.enable", "true"),
                ("traefik.http.routers.app.rule", "Host(`app.example.com`)"),
            ]),
            true,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "explicit.example.com");
    }
}
