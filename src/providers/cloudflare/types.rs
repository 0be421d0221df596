use serde::{Deserialize, Serialize};

use crate::core::record::{DNSRecord, DNSRecordType};

/// TTL value Cloudflare uses for "automatic".
pub const AUTO_TTL: u32 = 1;

#[derive(Deserialize, Debug)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<CloudflareApiError>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CloudflareApiError {
    pub code: u32,
    pub message: String,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ResultInfo {
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CloudflareRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct CreateRecordRequest {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
}

/// PATCH body; fields not sent (e.g. `proxied`) keep their current value.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct UpdateRecordRequest {
    pub content: String,
    pub ttl: u32,
}

/// `None` for record types this tool does not manage.
pub fn to_dns_record(cr: &CloudflareRecord) -> Option<DNSRecord> {
    let record_type = DNSRecordType::parse(&cr.record_type)?;
    let ttl = (cr.ttl != AUTO_TTL).then_some(cr.ttl);
    Some(DNSRecord::new(record_type, &cr.name, cr.content.clone(), ttl))
}

pub fn to_cloudflare_record(rec: &DNSRecord) -> CreateRecordRequest {
    CreateRecordRequest {
        record_type: rec.record_type.to_string(),
        name: rec.name.clone(),
        content: rec.value.clone(),
        ttl: rec.ttl.unwrap_or(AUTO_TTL),
    }
}
