use crate::lookup::error::LookupError;
use crate::lookup::response::interpret_response;
use crate::lookup::result::GeolocationResult;
use crate::uri_tools::compose_uri;
use crate::validator::IpList;

use hyper::client::{Client, HttpConnector};
use hyper::http::uri::Uri;
use hyper::Body;
use hyper_tls::HttpsConnector;

/// Client of the ipstack bulk lookup endpoint.
///
/// Every lookup is a single request: no retries, no timeouts.
#[derive(Clone)]
pub struct GeolocationClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    base_uri: Uri,
    access_key: String,
    security: bool,
}

impl GeolocationClient {
    pub fn new(base_uri: Uri, access_key: String, security: bool) -> Self {
        let https = HttpsConnector::new();
        Self {
            client: Client::builder().build::<_, Body>(https),
            base_uri,
            access_key,
            security,
        }
    }

    pub fn lookup_uri(&self, ips: &IpList) -> Result<Uri, LookupError> {
        let security = if self.security { "1" } else { "0" };
        Ok(compose_uri(
            &self.base_uri,
            &ips.joined(),
            &[("access_key", self.access_key.as_str()), ("security", security)],
        )?)
    }

    pub async fn lookup(&self, ips: &IpList) -> Result<Vec<GeolocationResult>, LookupError> {
        let uri = self.lookup_uri(ips)?;
        log::debug!("Requesting geolocation of {} addresses", ips.len());
        let request = hyper::Request::get(uri).body(Body::empty())?;
        let response = self.client.request(request).await?;
        if !response.status().is_success() {
            return Err(response.status().into());
        }
        let body = hyper::body::to_bytes(response.into_body()).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        interpret_response(value)
    }
}
