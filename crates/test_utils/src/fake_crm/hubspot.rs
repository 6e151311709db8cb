//! Fake HubSpot CRM v3 API

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Map, Value};

use super::{json_response, serve, Control, RecordedRequest};

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";
const SEARCH_PATH: &str = "/crm/v3/objects/contacts/search";
const PROPERTIES_PATH: &str = "/crm/v3/properties/contacts";
const ACCOUNT_PATH: &str = "/account-info/v3/details";

pub const DEFAULT_PORTAL_ID: u64 = 24_681_357;

/// A contact held by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct FakeHubSpotContact {
    pub id: String,
    pub properties: Map<String, Value>,
}

impl FakeHubSpotContact {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "properties": self.properties,
            "archived": false
        })
    }
}

#[derive(Debug)]
struct HubSpotData {
    contacts: Vec<FakeHubSpotContact>,
    properties: Vec<String>,
    next_id: u64,
}

#[derive(Debug)]
struct HubSpotState {
    token: String,
    control: Control,
    data: Mutex<HubSpotData>,
}

/// In-process HubSpot server
#[derive(Debug, Clone)]
pub struct FakeHubSpot {
    base_url: String,
    state: Arc<HubSpotState>,
}

impl FakeHubSpot {
    /// Starts a fake accepting the token `pat-test-token`
    pub async fn start() -> Self {
        Self::with_token("pat-test-token").await
    }

    pub async fn with_token(token: impl Into<String>) -> Self {
        let state = Arc::new(HubSpotState {
            token: token.into(),
            control: Control::default(),
            data: Mutex::new(HubSpotData {
                contacts: Vec::new(),
                properties: ["email", "firstname", "lastname", "phone", "twitterhandle", "discord_username"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                next_id: 1001,
            }),
        });

        let router = Router::new().fallback(dispatch).with_state(state.clone());
        let addr = serve(router).await;

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn token(&self) -> String {
        self.state.token.clone()
    }

    /// Adds a contact and returns its id
    pub fn seed_contact(&self, email: &str) -> String {
        let mut properties = Map::new();
        properties.insert("email".into(), json!(email));
        self.state.data.lock().unwrap().insert(properties)
    }

    /// Replaces the contact property schema
    pub fn set_properties(&self, names: &[&str]) {
        self.state.data.lock().unwrap().properties = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn contacts(&self) -> Vec<FakeHubSpotContact> {
        self.state.data.lock().unwrap().contacts.clone()
    }

    pub fn contacts_with_email(&self, email: &str) -> Vec<FakeHubSpotContact> {
        self.contacts()
            .into_iter()
            .filter(|c| c.property("email").is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .collect()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.control.requests()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.state.control.requests_to(method, path)
    }

    /// Answers every `method path` request with the given status and body
    pub fn stub(&self, method: Method, path: &str, status: u16, body: Value) {
        self.state.control.stub(method, path, status, body);
    }

    /// Same as [`Self::stub`], for error statuses
    pub fn fail(&self, method: Method, path: &str, status: u16, body: Value) {
        self.stub(method, path, status, body);
    }

    /// Delays every response
    pub fn set_delay(&self, delay: Duration) {
        self.state.control.set_delay(delay);
    }
}

impl HubSpotData {
    fn insert(&mut self, properties: Map<String, Value>) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.contacts.push(FakeHubSpotContact { id: id.clone(), properties });
        id
    }

    fn unknown_properties(&self, properties: &Map<String, Value>) -> Vec<String> {
        properties
            .keys()
            .filter(|k| !self.properties.contains(k))
            .cloned()
            .collect()
    }
}

async fn dispatch(
    State(state): State<Arc<HubSpotState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let request = RecordedRequest::new(&method, &path, query, &headers, &body);
    state.control.record(request.clone());

    if let Some(delay) = state.control.delay() {
        tokio::time::sleep(delay).await;
    }

    let expected = format!("Bearer {}", state.token);
    if request.authorization.as_deref() != Some(expected.as_str()) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({
                "status": "error",
                "message": "Authentication credentials not found.",
                "category": "INVALID_AUTHENTICATION"
            }),
        );
    }

    if let Some(response) = state.control.stubbed(&method, &path) {
        return response;
    }

    let mut data = state.data.lock().unwrap();
    handle(&mut data, &request)
}

fn handle(data: &mut HubSpotData, request: &RecordedRequest) -> Response {
    let path = request.path.as_str();

    match (request.method.as_str(), path) {
        ("GET", CONTACTS_PATH) => {
            let limit = request
                .query
                .get("limit")
                .and_then(|l| l.parse::<usize>().ok())
                .unwrap_or(10);
            let results: Vec<Value> = data.contacts.iter().take(limit).map(|c| c.to_json()).collect();
            json_response(StatusCode::OK, json!({ "results": results }))
        }
        ("POST", SEARCH_PATH) => search(data, &request.body),
        ("POST", CONTACTS_PATH) => {
            let properties = properties_of(&request.body);
            if let Some(response) = reject_unknown(data, &properties) {
                return response;
            }
            let id = data.insert(properties);
            let created = data.contacts.iter().find(|c| c.id == id).map(|c| c.to_json());
            json_response(StatusCode::CREATED, created.unwrap_or(Value::Null))
        }
        ("PATCH", _) if path.starts_with(CONTACTS_PATH) => {
            let id = path.trim_start_matches(CONTACTS_PATH).trim_start_matches('/');
            let properties = properties_of(&request.body);
            if let Some(response) = reject_unknown(data, &properties) {
                return response;
            }
            match data.contacts.iter_mut().find(|c| c.id == id) {
                Some(contact) => {
                    contact.properties.extend(properties);
                    json_response(StatusCode::OK, contact.to_json())
                }
                None => json_response(
                    StatusCode::NOT_FOUND,
                    json!({ "status": "error", "message": "resource not found", "category": "OBJECT_NOT_FOUND" }),
                ),
            }
        }
        ("GET", PROPERTIES_PATH) => {
            let results: Vec<Value> = data
                .properties
                .iter()
                .map(|name| json!({ "name": name, "label": name, "type": "string" }))
                .collect();
            json_response(StatusCode::OK, json!({ "results": results }))
        }
        ("GET", ACCOUNT_PATH) => json_response(
            StatusCode::OK,
            json!({ "portalId": DEFAULT_PORTAL_ID, "timeZone": "US/Eastern", "currency": "USD" }),
        ),
        _ => json_response(
            StatusCode::NOT_FOUND,
            json!({ "status": "error", "message": format!("No route for {} {}", request.method, path) }),
        ),
    }
}

fn search(data: &HubSpotData, body: &Value) -> Response {
    let limit = body.get("limit").and_then(Value::as_u64).unwrap_or(10) as usize;
    let email = body
        .pointer("/filterGroups/0/filters/0")
        .filter(|f| f.get("propertyName").and_then(Value::as_str) == Some("email"))
        .and_then(|f| f.get("value"))
        .and_then(Value::as_str);

    let matches: Vec<&FakeHubSpotContact> = data
        .contacts
        .iter()
        .filter(|c| match email {
            Some(email) => c.property("email").is_some_and(|e| e.eq_ignore_ascii_case(email)),
            None => true,
        })
        .collect();

    let results: Vec<Value> = matches.iter().take(limit).map(|c| c.to_json()).collect();
    json_response(StatusCode::OK, json!({ "total": matches.len(), "results": results }))
}

fn properties_of(body: &Value) -> Map<String, Value> {
    body.get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn reject_unknown(data: &HubSpotData, properties: &Map<String, Value>) -> Option<Response> {
    let unknown = data.unknown_properties(properties);
    if unknown.is_empty() {
        return None;
    }
    let errors: Vec<Value> = unknown
        .iter()
        .map(|name| {
            json!({
                "message": format!("Property \"{}\" does not exist", name),
                "code": "PROPERTY_DOESNT_EXIST",
                "context": { "propertyName": [name] }
            })
        })
        .collect();
    Some(json_response(
        StatusCode::BAD_REQUEST,
        json!({
            "status": "error",
            "message": "Property values were not valid",
            "category": "VALIDATION_ERROR",
            "errors": errors
        }),
    ))
}
