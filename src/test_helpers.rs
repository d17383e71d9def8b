//! Local stand-in for the geolocation API used by unit tests.

use hyper::http::Uri;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FakeUpstream {
    pub uri: Uri,
    /// Path and query of every received request
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve the same response to every request, must be called inside a tokio runtime
pub fn fake_upstream(status: StatusCode, body: &'static str) -> FakeUpstream {
    fake_upstream_with(move |_| (status, Duration::ZERO, body.to_owned()))
}

/// Answer each request with the status, delay and body chosen by `respond` from its URI
pub fn fake_upstream_with<F>(respond: F) -> FakeUpstream
where
    F: Fn(&Uri) -> (StatusCode, Duration, String) + Send + Sync + 'static,
{
    let respond = Arc::new(respond);
    let requests = Arc::new(Mutex::new(vec![]));
    let requests_clone = requests.clone();
    let make_service = make_service_fn(move |_: &AddrStream| {
        let requests = requests_clone.clone();
        let respond = respond.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |request: Request<Body>| {
                requests.lock().unwrap().push(request.uri().to_string());
                let (status, delay, body) = respond(request.uri());
                async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, Infallible>(
                        Response::builder()
                            .status(status)
                            .header("Content-Type", "application/json")
                            .body(Body::from(body))
                            .unwrap(),
                    )
                }
            }))
        }
    });
    let address: SocketAddr = ([127, 0, 0, 1], 0).into();
    let server = Server::bind(&address).serve(make_service);
    let uri = format!("http://{}/", server.local_addr()).parse().unwrap();
    tokio::spawn(server);
    FakeUpstream { uri, requests }
}
