//! Fake CRM Servers
//!
//! In-process stand-ins for the HubSpot and Close.com REST APIs, served by
//! axum on an ephemeral localhost port. They keep just enough state to answer
//! the calls the adapters make, record every request, check credentials the
//! way the real services do, and can be told to fail or stall specific
//! routes.
//!
//! # Usage
//!
//! ```rust,ignore
//! let hubspot = FakeHubSpot::start().await;
//! let adapter = HubSpotAdapter::new(HubSpotConfig {
//!     base_url: hubspot.base_url(),
//!     ..HubSpotConfig::new(hubspot.token())
//! })?;
//! ```

pub mod close;
pub mod hubspot;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;

pub use close::{FakeClose, FakeCloseContact, FakeCloseLead, FakeCloseNote};
pub use hubspot::{FakeHubSpot, FakeHubSpotContact};

/// A request as the fake server received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    /// Parsed JSON body, `Null` when empty or not JSON
    pub body: Value,
}

impl RecordedRequest {
    fn new(
        method: &Method,
        path: &str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        Self {
            method: method.clone(),
            path: path.to_string(),
            query,
            authorization: headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(body).unwrap_or(Value::Null),
        }
    }
}

/// Request log, stubbed responses and latency shared by both fakes
#[derive(Debug, Default)]
struct Control {
    requests: Mutex<Vec<RecordedRequest>>,
    stubs: Mutex<HashMap<(Method, String), (StatusCode, Value)>>,
    delay: Mutex<Option<Duration>>,
}

impl Control {
    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn stub(&self, method: Method, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.stubs
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
    }

    fn stubbed(&self, method: &Method, path: &str) -> Option<Response> {
        self.stubs
            .lock()
            .unwrap()
            .get(&(method.clone(), path.to_string()))
            .map(|(status, body)| json_response(*status, body.clone()))
    }

    fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    fn delay(&self) -> Option<Duration> {
        *self.delay.lock().unwrap()
    }
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Serves the router on 127.0.0.1 with an OS-assigned port
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake CRM listener");
    let addr = listener.local_addr().expect("fake CRM local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}
