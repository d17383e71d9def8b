use crate::lookup::record::{ConnectionRecord, GeolocationRecord, SecurityRecord};

use serde::{Deserialize, Serialize};

/// Placeholder for text data missing in the upstream response
pub const UNKNOWN: &str = "Unknown";

/// Countries which IP addresses are marked as suspicious.
///
/// Names are compared exactly, so "iran" or "Iran " are not suspicious.
pub const SUSPICIOUS_COUNTRIES: [&str; 3] = ["North Korea", "Iran", "Syria"];

pub fn is_suspicious_country(country_name: &str) -> bool {
    SUSPICIOUS_COUNTRIES.contains(&country_name)
}

/// Normalized geolocation of a single IP address, every field is always defined
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeolocationResult {
    pub ip: String,
    pub continent_name: String,
    pub country_name: String,
    pub region_name: String,
    pub city: String,
    pub zip: String,
    pub latitude: f64,
    pub longitude: f64,
    pub connection_type: String,
    pub connection: Connection,
    pub security: Security,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub isp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Security {
    pub is_proxy: bool,
    pub is_crawler: bool,
    pub is_tor: bool,
    pub threat_level: String,
    pub threat_types: Vec<String>,
}

impl GeolocationResult {
    pub fn is_suspicious(&self) -> bool {
        is_suspicious_country(&self.country_name)
    }
}

fn text_or_unknown(value: Option<String>) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            isp: UNKNOWN.to_owned(),
        }
    }
}

impl From<ConnectionRecord> for Connection {
    fn from(record: ConnectionRecord) -> Self {
        Self {
            isp: text_or_unknown(record.isp),
        }
    }
}

impl Default for Security {
    fn default() -> Self {
        Self {
            is_proxy: false,
            is_crawler: false,
            is_tor: false,
            threat_level: UNKNOWN.to_owned(),
            threat_types: vec![],
        }
    }
}

impl From<SecurityRecord> for Security {
    fn from(record: SecurityRecord) -> Self {
        Self {
            is_proxy: record.is_proxy.unwrap_or(false),
            is_crawler: record.is_crawler.unwrap_or(false),
            is_tor: record.is_tor.unwrap_or(false),
            threat_level: text_or_unknown(record.threat_level),
            threat_types: record.threat_types.unwrap_or_default(),
        }
    }
}

impl From<GeolocationRecord> for GeolocationResult {
    fn from(record: GeolocationRecord) -> Self {
        Self {
            ip: record.ip,
            continent_name: text_or_unknown(record.continent_name),
            country_name: text_or_unknown(record.country_name),
            region_name: text_or_unknown(record.region_name),
            city: text_or_unknown(record.city),
            zip: text_or_unknown(record.zip),
            latitude: record.latitude.unwrap_or(0.0),
            longitude: record.longitude.unwrap_or(0.0),
            connection_type: text_or_unknown(record.connection_type),
            connection: record.connection.map(Into::into).unwrap_or_default(),
            security: record.security.map(Into::into).unwrap_or_default(),
        }
    }
}
