use crate::config::Config;
use crate::lookup::{GeolocationClient, GeolocationResult};
use crate::render::render_page;
use crate::session::{SessionId, SessionStore};
use crate::validator::IpList;

use hyper::body::HttpBody;
use hyper::header::{
    HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE,
};
use hyper::http::response::Builder;
use hyper::{Body, Method, Request, Response, StatusCode, Uri};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use url::form_urlencoded;

const FORM_FIELD: &str = "ips";

/// Fifty addresses take well under a kilobyte
pub const MAX_FORM_BYTES: usize = 16 * 1024;

pub const SESSION_COOKIE: &str = "ip2location_session";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Nothing is found at {0}")]
    NotFound(Uri),
    #[error("Method {0} is not allowed here")]
    MethodNotAllowed(Method),
    #[error("Invalid query {0:?}")]
    InvalidQuery(String),
    #[error("Cannot read request body: {0}")]
    RequestBody(#[from] hyper::Error),
    #[error("Request body is larger than {} bytes", MAX_FORM_BYTES)]
    PayloadTooLarge,
    #[error(r#"Internal server error: "{0:?}""#)]
    InternalServerError(#[from] hyper::http::Error),
    #[error("Cannot serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Body of the JSON lookup endpoint, either `{"results": [...]}` or `{"error": "..."}`
#[derive(Serialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum LookupReply {
    Results(Vec<GeolocationResult>),
    Error(String),
}

impl From<Result<Vec<GeolocationResult>, String>> for LookupReply {
    fn from(outcome: Result<Vec<GeolocationResult>, String>) -> Self {
        match outcome {
            Ok(results) => Self::Results(results),
            Err(message) => Self::Error(message),
        }
    }
}

pub struct IpLookupService {
    client: GeolocationClient,
    response_headers: HeaderMap,
    sessions: Mutex<SessionStore>,
}

impl IpLookupService {
    pub fn new(client: GeolocationClient, response_headers: HeaderMap) -> Self {
        Self {
            client,
            response_headers,
            sessions: Mutex::new(SessionStore::new()),
        }
    }

    /// Build the service, the API access key is read from the environment once, here
    pub fn from_config(config: &Config) -> Self {
        let client = GeolocationClient::new(
            config.api.uri.clone(),
            config.api.access_key(),
            config.api.security,
        );
        Self::new(client, config.response_headers.clone())
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate the input and look the addresses up, failures are converted to user messages
    pub async fn lookup(&self, text: &str) -> Result<Vec<GeolocationResult>, String> {
        let ips = IpList::parse(text).map_err(|error| error.to_string())?;
        match self.client.lookup(&ips).await {
            Ok(results) => {
                if results.len() < ips.len() {
                    log::info!(
                        "Got {} valid records for {} addresses",
                        results.len(),
                        ips.len()
                    );
                }
                Ok(results)
            }
            Err(error) => {
                log::error!("API call error: {error}");
                Err(error.user_message().to_owned())
            }
        }
    }

    /// Run a lookup as a new submission of the browser's page
    pub async fn submit(&self, session_id: &SessionId, text: &str) {
        let ticket = self.sessions().session_mut(session_id).begin_submission();
        let outcome = self.lookup(text).await;
        // Lost if the session was evicted meanwhile, the fresh one has an older ticket
        self.sessions()
            .session_mut(session_id)
            .complete(ticket, outcome);
    }

    pub fn page(&self, session_id: &SessionId) -> String {
        render_page(self.sessions().session_mut(session_id))
    }

    pub fn toggle_expand(&self, session_id: &SessionId, index: usize) {
        self.sessions().session_mut(session_id).toggle_expand(index);
    }
}

fn form_field(body: &[u8], name: &str) -> String {
    form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn expand_index(query: Option<&str>) -> Result<Option<usize>, ServiceError> {
    let query = match query {
        Some(query) => query,
        None => return Ok(None),
    };
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "expand")
        .map(|(_, value)| {
            value
                .parse()
                .map_err(|_| ServiceError::InvalidQuery(query.to_owned()))
        })
        .transpose()
}

async fn read_form_field(request: Request<Body>, name: &str) -> Result<String, ServiceError> {
    let declared_length = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if matches!(declared_length, Some(length) if length > MAX_FORM_BYTES) {
        return Err(ServiceError::PayloadTooLarge);
    }
    let mut body = request.into_body();
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > MAX_FORM_BYTES {
            return Err(ServiceError::PayloadTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(form_field(&bytes, name))
}

fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}

/// Session id of the browser and whether it has to be issued as a new cookie
fn browser_session(headers: &HeaderMap) -> (SessionId, bool) {
    match session_cookie(headers) {
        Some(session_id) => (session_id, false),
        None => (SessionId::generate(), true),
    }
}

fn with_session_cookie(builder: Builder, session_id: &SessionId, is_new: bool) -> Builder {
    if is_new {
        builder.header(
            SET_COOKIE,
            format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
                session_id.as_str()
            ),
        )
    } else {
        builder
    }
}

fn redirect_to_page() -> Builder {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(LOCATION, "/")
}

impl IpLookupService {
    pub async fn response(&self, request: Request<Body>) -> Result<Response<Body>, ServiceError> {
        match (request.method(), request.uri().path()) {
            (&Method::GET, "/") => {
                let (session_id, is_new) = browser_session(request.headers());
                let response = match expand_index(request.uri().query())? {
                    // Redirect, so reloading the page doesn't toggle the card back
                    Some(index) => {
                        self.toggle_expand(&session_id, index);
                        with_session_cookie(redirect_to_page(), &session_id, is_new)
                            .body(Body::empty())?
                    }
                    None => with_session_cookie(Response::builder(), &session_id, is_new)
                        .header(CONTENT_TYPE, "text/html; charset=utf-8")
                        .body(self.page(&session_id).into())?,
                };
                Ok(response)
            }
            (&Method::POST, "/") => {
                let (session_id, is_new) = browser_session(request.headers());
                let text = read_form_field(request, FORM_FIELD).await?;
                self.submit(&session_id, &text).await;
                Ok(with_session_cookie(redirect_to_page(), &session_id, is_new)
                    .body(Body::empty())?)
            }
            (&Method::POST, "/api/lookup") => {
                let text = read_form_field(request, FORM_FIELD).await?;
                let reply: LookupReply = self.lookup(&text).await.into();
                Ok(Response::builder()
                    .header(CONTENT_TYPE, "application/json")
                    .body(serde_json::to_vec(&reply)?.into())?)
            }
            (method, "/" | "/api/lookup") => Err(ServiceError::MethodNotAllowed(method.clone())),
            _ => Err(ServiceError::NotFound(request.uri().clone())),
        }
    }

    /// Respond to any request, errors are converted to responses too
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let mut response = self
            .response(request)
            .await
            .unwrap_or_else(make_error_response);
        let headers = response.headers_mut();
        for (name, value) in &self.response_headers {
            headers.insert(name, value.clone());
        }
        response
    }
}

pub fn make_error_response(error: ServiceError) -> Response<Body> {
    let status = match error {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        ServiceError::InvalidQuery(_) | ServiceError::RequestBody(_) => StatusCode::BAD_REQUEST,
        ServiceError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ServiceError::InternalServerError(_) | ServiceError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let mut response = Response::new(Body::from(error.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

pub fn log_response(remote_ip: IpAddr, method: &Method, uri: &Uri, response: &Response<Body>) {
    log::info!(
        "{} {} {} {} {}",
        remote_ip,
        method,
        uri,
        response.status(),
        response
            .headers()
            .get(LOCATION)
            .map(|header_value| header_value.to_str().unwrap_or("-"))
            .unwrap_or("-"),
    );
}
