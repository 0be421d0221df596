use serde::{Deserialize, Serialize};

use crate::core::record::{DNSRecord, DNSRecordType};

#[derive(Deserialize, Debug, Clone)]
pub struct RewriteList {
    pub data: Vec<NextDNSRecord>,
}

/// A rewrite as NextDNS stores it. Rewrites carry no type; it follows from
/// the content.
#[derive(Deserialize, Debug, Clone)]
pub struct NextDNSRecord {
    pub id: String,
    pub name: String,
    pub content: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct CreateRecordRequest {
    pub name: String,
    pub content: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct UpdateRecordRequest {
    pub content: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<NextDNSError>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NextDNSError {
    pub code: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl NextDNSRecord {
    pub fn record_type(&self) -> Option<DNSRecordType> {
        DNSRecordType::from_value(&self.content)
    }
}

/// Only address rewrites are managed; hostname rewrites are left alone.
pub fn to_dns_record(nr: &NextDNSRecord) -> Option<DNSRecord> {
    let record_type = nr.record_type()?;
    Some(DNSRecord::new(record_type, &nr.name, nr.content.clone(), None))
}

pub fn to_nextdns_record(rec: &DNSRecord) -> CreateRecordRequest {
    CreateRecordRequest {
        name: rec.name.clone(),
        content: rec.value.clone(),
    }
}
