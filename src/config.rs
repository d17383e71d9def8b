#[cfg(not(feature = "multi-thread"))]
use crate::unavailable::Unavailable;

use hyper::header::HeaderMap;
use hyper::http::Uri;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::net::SocketAddr;
#[cfg(feature = "multi-thread")]
use std::num::NonZeroUsize;
use std::path::Path;

lazy_static! {
    static ref IPSTACK_URI: Uri = "http://api.ipstack.com/".parse().unwrap();
}

const DEFAULT_ACCESS_KEY_ENV: &str = "IPSTACK_API_KEY";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_host")]
    pub host: SocketAddr,
    #[serde(default = "Config::default_log_level")]
    pub log_level: log::Level,
    #[serde(default, with = "http_serde::header_map")]
    pub response_headers: HeaderMap,
    #[serde(default)]
    pub threads: ConfigThreads,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    fn default_host() -> SocketAddr {
        ([127, 0, 0, 1], 8080).into()
    }

    fn default_log_level() -> log::Level {
        log::Level::Info
    }
}

/// Number of runtime worker threads, zero means one thread per CPU core
#[cfg(feature = "multi-thread")]
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(from = "usize")]
pub enum ConfigThreads {
    Cores,
    Custom(NonZeroUsize),
}

#[cfg(feature = "multi-thread")]
impl Default for ConfigThreads {
    fn default() -> Self {
        Self::Cores
    }
}

#[cfg(feature = "multi-thread")]
impl From<usize> for ConfigThreads {
    fn from(threads: usize) -> Self {
        match NonZeroUsize::new(threads) {
            Some(threads) => Self::Custom(threads),
            None => Self::Cores,
        }
    }
}

#[cfg(not(feature = "multi-thread"))]
pub type ConfigThreads = Unavailable;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_uri", alias = "url", with = "http_serde::uri")]
    pub uri: Uri,
    /// Name of the environment variable holding the API access key
    #[serde(default = "ApiConfig::default_access_key_env")]
    pub access_key_env: String,
    #[serde(default = "ApiConfig::default_security")]
    pub security: bool,
}

impl ApiConfig {
    pub fn default_uri() -> Uri {
        IPSTACK_URI.clone()
    }

    fn default_access_key_env() -> String {
        DEFAULT_ACCESS_KEY_ENV.to_owned()
    }

    fn default_security() -> bool {
        true
    }

    /// Read the access key from the environment.
    ///
    /// A missing key is not an error here, the API will reject our requests instead.
    pub fn access_key(&self) -> String {
        match std::env::var(&self.access_key_env) {
            Ok(key) => key,
            Err(error) => {
                log::warn!(
                    "Cannot read API access key from ${}: {error}",
                    self.access_key_env
                );
                String::new()
            }
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            access_key_env: Self::default_access_key_env(),
            security: Self::default_security(),
        }
    }
}

pub fn parse_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let toml_string = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&toml_string)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.host, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.log_level, log::Level::Info);
        assert!(config.response_headers.is_empty());
        assert_eq!(config.api.uri, "http://api.ipstack.com/");
        assert_eq!(config.api.access_key_env, "IPSTACK_API_KEY");
        assert!(config.api.security);
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
            host = "0.0.0.0:3000"
            log_level = "debug"

            [response_headers]
            Cache-Control = "no-store"

            [api]
            url = "https://api.ipstack.com/"
            access_key_env = "MY_IPSTACK_KEY"
            security = false
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, log::Level::Debug);
        assert_eq!(config.response_headers["cache-control"], "no-store");
        assert_eq!(config.api.uri, "https://api.ipstack.com/");
        assert_eq!(config.api.access_key_env, "MY_IPSTACK_KEY");
        assert!(!config.api.security);
    }

    #[test]
    fn unknown_field() {
        assert!(toml::from_str::<Config>("geolite2 = \"GeoLite2-Country.mmdb\"").is_err());
    }

    #[cfg(not(feature = "multi-thread"))]
    #[test]
    fn threads_need_feature() {
        assert!(toml::from_str::<Config>("threads = 4").is_err());
    }

    #[cfg(feature = "multi-thread")]
    #[test]
    fn threads() {
        let config: Config = toml::from_str("threads = 4").unwrap();
        assert_eq!(config.threads, ConfigThreads::Custom(4.try_into().unwrap()));
        let config: Config = toml::from_str("threads = 0").unwrap();
        assert_eq!(config.threads, ConfigThreads::Cores);
    }

    #[test]
    fn missing_access_key_is_empty() {
        let api = ApiConfig {
            access_key_env: "IP2LOCATION_TEST_SURELY_UNSET_KEY".into(),
            ..Default::default()
        };
        assert_eq!(api.access_key(), "");
    }
}
