use hyper::http::Uri;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UriError {
    #[error("Base URI {0:?} cannot be used as a base")]
    CannotBeBase(Uri),
    #[error(transparent)]
    Parse(#[from] url::ParseError),
    #[error(transparent)]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),
}

/// Append a single path segment and query pairs to the base URI.
///
/// The segment is percent-encoded as a path segment, so "/" and "?" in it don't change
/// the structure of the URI.
pub fn compose_uri(base_uri: &Uri, segment: &str, query: &[(&str, &str)]) -> Result<Uri, UriError> {
    let mut url = Url::parse(&base_uri.to_string())?;
    url.path_segments_mut()
        .map_err(|_| UriError::CannotBeBase(base_uri.clone()))?
        .pop_if_empty()
        .push(segment);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.as_str().parse()?)
}
