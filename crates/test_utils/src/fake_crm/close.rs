//! Fake Close.com API v1

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Value};

use super::{json_response, serve, Control, RecordedRequest};

pub const ORGANIZATION_ID: &str = "orga_aura7Qf2";

/// A lead held by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct FakeCloseLead {
    pub id: String,
    pub name: String,
    /// `custom.<field id>` values
    pub custom: Map<String, Value>,
    /// Status is owned by sales; the fake keeps whatever was last written
    pub status_label: Option<String>,
}

/// A contact held by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct FakeCloseContact {
    pub id: String,
    pub lead_id: String,
    pub name: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// A note attached to a lead
#[derive(Debug, Clone, PartialEq)]
pub struct FakeCloseNote {
    pub lead_id: String,
    pub note: String,
}

#[derive(Debug, Default)]
struct CloseData {
    leads: Vec<FakeCloseLead>,
    contacts: Vec<FakeCloseContact>,
    notes: Vec<FakeCloseNote>,
    custom_fields: Vec<String>,
    next_id: u64,
}

#[derive(Debug)]
struct CloseState {
    api_key: String,
    expected_authorization: String,
    control: Control,
    data: Mutex<CloseData>,
}

/// In-process Close.com server
#[derive(Debug, Clone)]
pub struct FakeClose {
    base_url: String,
    state: Arc<CloseState>,
}

impl FakeClose {
    /// Starts a fake accepting the API key `api_test_key`
    pub async fn start() -> Self {
        Self::with_api_key("api_test_key").await
    }

    pub async fn with_api_key(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let state = Arc::new(CloseState {
            expected_authorization: basic_authorization(&api_key),
            api_key,
            control: Control::default(),
            data: Mutex::new(CloseData::default()),
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

    pub fn api_key(&self) -> String {
        self.state.api_key.clone()
    }

    /// Adds a lead, with a contact when an email is given, and returns the lead id
    pub fn seed_lead(&self, name: &str, email: Option<&str>) -> String {
        let mut data = self.state.data.lock().unwrap();
        let lead_id = data.next("lead");
        data.leads.push(FakeCloseLead {
            id: lead_id.clone(),
            name: name.to_string(),
            custom: Map::new(),
            status_label: Some("Qualified".to_string()),
        });
        if let Some(email) = email {
            let contact_id = data.next("cont");
            data.contacts.push(FakeCloseContact {
                id: contact_id,
                lead_id: lead_id.clone(),
                name: name.to_string(),
                emails: vec![email.to_string()],
                phones: Vec::new(),
            });
        }
        lead_id
    }

    /// Declares lead custom fields by id
    pub fn add_custom_field(&self, id: &str) {
        self.state.data.lock().unwrap().custom_fields.push(id.to_string());
    }

    pub fn leads(&self) -> Vec<FakeCloseLead> {
        self.state.data.lock().unwrap().leads.clone()
    }

    pub fn contacts(&self) -> Vec<FakeCloseContact> {
        self.state.data.lock().unwrap().contacts.clone()
    }

    pub fn contacts_for(&self, lead_id: &str) -> Vec<FakeCloseContact> {
        self.contacts().into_iter().filter(|c| c.lead_id == lead_id).collect()
    }

    pub fn notes(&self) -> Vec<FakeCloseNote> {
        self.state.data.lock().unwrap().notes.clone()
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

/// Basic auth with the API key as user name and an empty password
fn basic_authorization(api_key: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{}:", api_key)))
}

impl CloseData {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{:06}", prefix, self.next_id)
    }

    fn lead_json(&self, lead: &FakeCloseLead) -> Value {
        let mut value = json!({
            "id": lead.id,
            "name": lead.name,
            "display_name": lead.name,
            "status_label": lead.status_label,
        });
        if let Some(object) = value.as_object_mut() {
            object.extend(lead.custom.clone());
        }
        value
    }

    fn unknown_custom_fields(&self, body: &Value) -> Map<String, Value> {
        body.as_object()
            .into_iter()
            .flatten()
            .filter_map(|(key, _)| key.strip_prefix("custom.").map(|id| (key, id)))
            .filter(|(_, id)| !self.custom_fields.iter().any(|f| f == id))
            .map(|(key, _)| (key.clone(), json!("Unknown custom field")))
            .collect()
    }

    fn apply_lead_body(lead: &mut FakeCloseLead, body: &Value) {
        if let Some(name) = body.get("name").and_then(Value::as_str) {
            lead.name = name.to_string();
        }
        if let Some(status) = body.get("status").and_then(Value::as_str) {
            lead.status_label = Some(status.to_string());
        }
        for (key, value) in body.as_object().into_iter().flatten() {
            if key.starts_with("custom.") {
                lead.custom.insert(key.clone(), value.clone());
            }
        }
    }
}

fn contact_json(contact: &FakeCloseContact) -> Value {
    json!({
        "id": contact.id,
        "lead_id": contact.lead_id,
        "name": contact.name,
        "emails": contact.emails.iter().map(|e| json!({ "email": e, "type": "office" })).collect::<Vec<_>>(),
        "phones": contact.phones.iter().map(|p| json!({ "phone": p, "type": "office" })).collect::<Vec<_>>(),
    })
}

fn list_values(body: &Value, key: &str, field: &str) -> Vec<String> {
    body.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn field_errors(errors: Map<String, Value>) -> Response {
    json_response(
        StatusCode::BAD_REQUEST,
        json!({ "errors": [], "field-errors": errors }),
    )
}

fn not_found(kind: &str) -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        json!({ "error": format!("Empty query: {} matching query does not exist.", kind) }),
    )
}

fn page(data: Vec<Value>, query: &HashMap<String, String>) -> Response {
    let total = data.len();
    let limit = query
        .get("_limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(100);
    let data: Vec<Value> = data.into_iter().take(limit).collect();
    json_response(
        StatusCode::OK,
        json!({ "has_more": total > data.len(), "total_results": total, "data": data }),
    )
}

async fn dispatch(
    State(state): State<Arc<CloseState>>,
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

    if request.authorization.as_deref() != Some(state.expected_authorization.as_str()) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "error": "The API key you provided is invalid." }),
        );
    }

    if let Some(response) = state.control.stubbed(&method, &path) {
        return response;
    }

    let mut data = state.data.lock().unwrap();
    handle(&mut data, &request)
}

fn handle(data: &mut CloseData, request: &RecordedRequest) -> Response {
    let path = request.path.as_str();
    let body = &request.body;

    match (request.method.as_str(), path) {
        ("GET", "/lead/") => {
            let email = request
                .query
                .get("query")
                .and_then(|q| q.strip_prefix("email:"))
                .map(str::to_string);
            let leads: Vec<Value> = data
                .leads
                .iter()
                .filter(|lead| match &email {
                    Some(email) => data.contacts.iter().any(|c| {
                        c.lead_id == lead.id && c.emails.iter().any(|e| e.eq_ignore_ascii_case(email))
                    }),
                    None => true,
                })
                .map(|lead| data.lead_json(lead))
                .collect();
            page(leads, &request.query)
        }
        ("POST", "/lead/") => {
            let mut errors = data.unknown_custom_fields(body);
            if body.get("name").and_then(Value::as_str).map_or(true, str::is_empty) {
                errors.insert("name".into(), json!("This field is required."));
            }
            if !errors.is_empty() {
                return field_errors(errors);
            }
            let mut lead = FakeCloseLead {
                id: data.next("lead"),
                name: String::new(),
                custom: Map::new(),
                status_label: Some("Potential".to_string()),
            };
            CloseData::apply_lead_body(&mut lead, body);
            let response = data.lead_json(&lead);
            data.leads.push(lead);
            json_response(StatusCode::OK, response)
        }
        ("PUT", _) if path.starts_with("/lead/") => {
            let errors = data.unknown_custom_fields(body);
            if !errors.is_empty() {
                return field_errors(errors);
            }
            let id = path.trim_start_matches("/lead/").trim_end_matches('/');
            let Some(index) = data.leads.iter().position(|l| l.id == id) else {
                return not_found("Lead");
            };
            CloseData::apply_lead_body(&mut data.leads[index], body);
            let response = data.lead_json(&data.leads[index]);
            json_response(StatusCode::OK, response)
        }
        ("GET", "/contact/") => {
            let lead_id = request.query.get("lead_id");
            let contacts: Vec<Value> = data
                .contacts
                .iter()
                .filter(|c| lead_id.map_or(true, |id| &c.lead_id == id))
                .map(contact_json)
                .collect();
            page(contacts, &request.query)
        }
        ("POST", "/contact/") => {
            let lead_id = body.get("lead_id").and_then(Value::as_str).unwrap_or_default().to_string();
            if !data.leads.iter().any(|l| l.id == lead_id) {
                let mut errors = Map::new();
                errors.insert("lead_id".into(), json!("Lead matching query does not exist."));
                return field_errors(errors);
            }
            let contact = FakeCloseContact {
                id: data.next("cont"),
                lead_id,
                name: body.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                emails: list_values(body, "emails", "email"),
                phones: list_values(body, "phones", "phone"),
            };
            let response = contact_json(&contact);
            data.contacts.push(contact);
            json_response(StatusCode::OK, response)
        }
        ("PUT", _) if path.starts_with("/contact/") => {
            let id = path.trim_start_matches("/contact/").trim_end_matches('/');
            let Some(contact) = data.contacts.iter_mut().find(|c| c.id == id) else {
                return not_found("Contact");
            };
            if let Some(name) = body.get("name").and_then(Value::as_str) {
                contact.name = name.to_string();
            }
            if body.get("emails").is_some() {
                contact.emails = list_values(body, "emails", "email");
            }
            if body.get("phones").is_some() {
                contact.phones = list_values(body, "phones", "phone");
            }
            json_response(StatusCode::OK, contact_json(contact))
        }
        ("POST", "/activity/note/") => {
            let note = FakeCloseNote {
                lead_id: body.get("lead_id").and_then(Value::as_str).unwrap_or_default().to_string(),
                note: body.get("note").and_then(Value::as_str).unwrap_or_default().to_string(),
            };
            let id = data.next("acti");
            let response = json!({ "id": id, "lead_id": note.lead_id, "note": note.note });
            data.notes.push(note);
            json_response(StatusCode::OK, response)
        }
        ("GET", "/me/") => json_response(
            StatusCode::OK,
            json!({
                "id": "user_sam",
                "first_name": "Sam",
                "last_name": "Seller",
                "email": "sam@auraforge.io",
                "organizations": [{ "id": ORGANIZATION_ID, "name": "Aura Forge" }]
            }),
        ),
        ("GET", "/custom_field/lead/") => {
            let fields: Vec<Value> = data
                .custom_fields
                .iter()
                .map(|id| json!({ "id": id, "name": id, "type": "text" }))
                .collect();
            json_response(StatusCode::OK, json!({ "has_more": false, "data": fields }))
        }
        _ => json_response(
            StatusCode::NOT_FOUND,
            json!({ "error": format!("No route for {} {}", request.method, path) }),
        ),
    }
}
