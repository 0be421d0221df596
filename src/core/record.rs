use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DNSRecordType {
    A,
    AAAA,
}

impl DNSRecordType {
    pub const ALL: [DNSRecordType; 2] = [DNSRecordType::A, DNSRecordType::AAAA];

    /// Infers the record type from an address literal, for backends whose
    /// API stores only the answer.
    pub fn from_value(value: &str) -> Option<Self> {
        if value.parse::<Ipv4Addr>().is_ok() {
            Some(DNSRecordType::A)
        } else if value.parse::<Ipv6Addr>().is_ok() {
            Some(DNSRecordType::AAAA)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DNSRecordType::A => "A",
            DNSRecordType::AAAA => "AAAA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(DNSRecordType::A),
            "AAAA" => Some(DNSRecordType::AAAA),
            _ => None,
        }
    }
}

impl fmt::Display for DNSRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DNSRecord {
    pub record_type: DNSRecordType,
    pub name: String,
    pub value: String,
    pub ttl: Option<u32>,
}

impl DNSRecord {
    pub fn new(
        record_type: DNSRecordType,
        name: impl AsRef<str>,
        value: impl Into<String>,
        ttl: Option<u32>,
    ) -> Self {
        Self {
            record_type,
            name: normalize_name(name.as_ref()),
            value: value.into(),
            ttl,
        }
    }

    /// True when this record already carries the wanted answer. A wanted ttl
    /// of `None` leaves the TTL up to the provider and matches anything.
    pub fn matches(
        &self,
        name: &str,
        record_type: DNSRecordType,
        value: &str,
        ttl: Option<u32>,
    ) -> bool {
        self.name == name
            && self.record_type == record_type
            && self.value == value
            && (ttl.is_none() || self.ttl == ttl)
    }
}

/// Lower-cases a domain name and strips the root dot.
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_a_record() {
        assert_eq!(DNSRecordType::from_value("1.2.3.4"), Some(DNSRecordType::A));
    }

    #[test]
    fn test_infer_aaaa_record() {
        assert_eq!(
            DNSRecordType::from_value("2001:db8::1"),
            Some(DNSRecordType::AAAA)
        );
    }

    #[test]
    fn test_infer_unmanaged_value() {
        assert_eq!(DNSRecordType::from_value("target.example.com"), None);
        assert_eq!(DNSRecordType::from_value("notanip"), None);
    }

    #[test]
    fn test_parse_round_trips_display() {
        for t in DNSRecordType::ALL {
            assert_eq!(DNSRecordType::parse(&t.to_string()), Some(t));
        }
        assert_eq!(DNSRecordType::parse("CNAME"), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("API.Example.COM."), "api.example.com");
        assert_eq!(normalize_name(" host.example.com "), "host.example.com");
    }

    #[test]
    fn test_new_normalizes_name() {
        let rec = DNSRecord::new(DNSRecordType::A, "Www.Example.com.", "1.1.1.1", None);
        assert_eq!(rec.name, "www.example.com");
    }

    #[test]
    fn test_matches_value_and_ttl() {
        let rec = DNSRecord::new(DNSRecordType::A, "a.com", "1.1.1.1", Some(300));
        assert!(rec.matches("a.com", DNSRecordType::A, "1.1.1.1", Some(300)));
        assert!(rec.matches("a.com", DNSRecordType::A, "1.1.1.1", None));
        assert!(!rec.matches("a.com", DNSRecordType::A, "2.2.2.2", None));
        assert!(!rec.matches("a.com", DNSRecordType::A, "1.1.1.1", Some(60)));
        assert!(!rec.matches("a.com", DNSRecordType::AAAA, "1.1.1.1", None));
    }
}
