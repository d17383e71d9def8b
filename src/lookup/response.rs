use crate::lookup::error::{LookupError, API_ERROR_FALLBACK};
use crate::lookup::record::GeolocationRecord;
use crate::lookup::result::GeolocationResult;

use serde_json::Value;

/// Validate and normalize a single untrusted record, `None` if it doesn't fit the schema
pub fn normalize_record(value: Value) -> Option<GeolocationResult> {
    match GeolocationRecord::try_from(value) {
        Ok(record) => Some(record.into()),
        Err(error) => {
            log::warn!("Dropping invalid geolocation record: {error}");
            None
        }
    }
}

fn api_error_info(object: &serde_json::Map<String, Value>) -> String {
    object
        .get("error")
        .and_then(|error| error.get("info"))
        .and_then(Value::as_str)
        .filter(|info| !info.is_empty())
        .unwrap_or(API_ERROR_FALLBACK)
        .to_owned()
}

/// Interpret a decoded API response body.
///
/// Bulk requests are answered with an array, but a single object is accepted too. Invalid
/// records are dropped, so the output can be shorter than the request.
pub fn interpret_response(body: Value) -> Result<Vec<GeolocationResult>, LookupError> {
    match body {
        Value::Object(object) => {
            if object.get("success") == Some(&Value::Bool(false)) {
                return Err(LookupError::Api(api_error_info(&object)));
            }
            Ok(normalize_record(Value::Object(object)).into_iter().collect())
        }
        Value::Array(items) => Ok(items.into_iter().filter_map(normalize_record).collect()),
        _ => Err(LookupError::UnexpectedFormat),
    }
}
