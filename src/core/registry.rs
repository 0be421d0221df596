use crate::core::provider::DNSProvider;
use crate::core::record::normalize_name;
use std::collections::BTreeMap;

/// Zone name to the provider that owns it. Every zone has exactly one
/// provider and zones are visited in name order.
#[derive(Default)]
pub struct ZoneRegistry {
    zones: BTreeMap<String, Box<dyn DNSProvider>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, zone: &str, provider: Box<dyn DNSProvider>) {
        self.zones.insert(normalize_name(zone), provider);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn DNSProvider)> {
        self.zones.iter().map(|(k, v)| (k.as_str(), &**v))
    }

    pub fn names(&self) -> Vec<String> {
        self.zones.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Picks the most specific zone that contains `name`. Returns `None` when
/// the name falls outside every zone.
pub fn zone_for<'a>(zones: &'a [String], name: &str) -> Option<&'a str> {
    zones
        .iter()
        .filter(|zone| in_zone(name, zone))
        .max_by_key(|zone| zone.len())
        .map(|zone| zone.as_str())
}

pub fn in_zone(name: &str, zone: &str) -> bool {
    name == zone
        || name
            .strip_suffix(zone)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
