pub use client::GeolocationClient;
pub use error::LookupError;
pub use record::GeolocationRecord;
pub use response::{interpret_response, normalize_record};
pub use result::{is_suspicious_country, GeolocationResult, SUSPICIOUS_COUNTRIES, UNKNOWN};

mod client;
pub mod error;
pub mod record;
mod response;
pub mod result;
