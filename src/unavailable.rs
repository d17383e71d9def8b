use serde::Deserialize;
use thiserror::Error;

/// Config item which is recognised but not supported by the current Cargo feature set.
///
/// Missing item deserializes to default, any given value is rejected.
#[derive(Debug, Deserialize, Default)]
#[serde(try_from = "toml::Value")]
pub struct Unavailable;

#[derive(Debug, Error)]
#[error("This configuration item requires ip2location built with additional Cargo features, e.g. \"multi-thread\"")]
pub struct UnavailableError;

impl TryFrom<toml::Value> for Unavailable {
    type Error = UnavailableError;

    fn try_from(_: toml::Value) -> Result<Self, Self::Error> {
        Err(UnavailableError)
    }
}
