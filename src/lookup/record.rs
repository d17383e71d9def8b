use serde::Deserialize;

/// Raw geolocation record as returned by the upstream API.
///
/// Only `ip` is required, everything else may be absent or `null`. A value of the wrong
/// type makes the whole record invalid. Unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GeolocationRecord {
    pub ip: String,
    pub continent_name: Option<String>,
    pub country_name: Option<String>,
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub connection_type: Option<String>,
    pub connection: Option<ConnectionRecord>,
    pub security: Option<SecurityRecord>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub isp: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SecurityRecord {
    pub is_proxy: Option<bool>,
    pub is_crawler: Option<bool>,
    pub is_tor: Option<bool>,
    pub threat_level: Option<String>,
    pub threat_types: Option<Vec<String>>,
}

impl TryFrom<serde_json::Value> for GeolocationRecord {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}
