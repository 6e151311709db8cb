//! HTTP API tests driving the full router with axum-test

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use domain_lead::{
    CloseConfig, CrmRegistry, CrmSettings, HubSpotConfig, LeadIntakeService, LeadRepository,
    MockLeadRepository,
};
use infra_store::InMemoryLeadRepository;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{FakeClose, FakeHubSpot, SubmissionFixtures};

fn server_with(
    repository: Arc<dyn LeadRepository>,
    registry: CrmRegistry,
    config: ApiConfig,
) -> TestServer {
    let service = LeadIntakeService::new(repository, registry.configured());
    let router = create_router(AppState::new(service, registry, config));
    TestServer::new(router).unwrap()
}

fn local_only_server() -> TestServer {
    server_with(
        Arc::new(InMemoryLeadRepository::new()),
        CrmRegistry::empty(),
        ApiConfig::default(),
    )
}

fn registry_for(hubspot: Option<HubSpotConfig>, close: Option<CloseConfig>) -> CrmRegistry {
    CrmRegistry::from_settings(CrmSettings { hubspot, close }).unwrap()
}

fn hubspot_config(fake: &FakeHubSpot, token: &str) -> HubSpotConfig {
    HubSpotConfig {
        base_url: fake.base_url(),
        ..HubSpotConfig::new(token)
    }
}

fn close_config(fake: &FakeClose) -> CloseConfig {
    CloseConfig {
        base_url: fake.base_url(),
        ..CloseConfig::new(fake.api_key())
    }
}

fn with_test_endpoints() -> ApiConfig {
    ApiConfig {
        enable_crm_test_endpoints: true,
        ..ApiConfig::default()
    }
}

// ============================================================================
// Lead submission
// ============================================================================

#[tokio::test]
async fn test_submit_then_list() {
    let server = local_only_server();

    let response = server.post("/api/leads").json(&SubmissionFixtures::json_body()).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Lead information submitted successfully");
    assert_eq!(body["data"]["name"], "Kai Nakamura");
    assert_eq!(body["data"]["twitterUrl"], "https://twitter.com/kai_builds");
    assert_eq!(body["data"]["referredBy"], Value::Null);
    assert!(body["data"]["id"].is_string());
    assert!(body.get("integrations").is_none());

    let list: Value = server.get("/api/leads").await.json();
    assert_eq!(list["success"], true);
    assert_eq!(list["count"], 1);
    assert_eq!(list["data"][0]["email"], "kai@guildhall.gg");
}

#[tokio::test]
async fn test_list_preserves_submission_order() {
    let server = local_only_server();

    for email in ["first@example.com", "second@example.com", "third@example.com"] {
        server
            .post("/api/leads")
            .json(&json!({ "name": "Jane Doe", "email": email }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let list: Value = server.get("/api/leads").await.json();
    let emails: Vec<_> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["email"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(emails, ["first@example.com", "second@example.com", "third@example.com"]);
}

#[tokio::test]
async fn test_invalid_submission_returns_field_errors() {
    let server = local_only_server();

    let response = server
        .post("/api/leads")
        .json(&json!({ "name": "J", "email": "not-an-email" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["email"].is_array());

    let list: Value = server.get("/api/leads").await.json();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_null_email_is_a_field_error() {
    let server = local_only_server();

    let response = server
        .post("/api/leads")
        .json(&json!({ "name": "Jane", "email": null }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"].get("name").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = local_only_server();

    let response = server
        .post("/api/leads")
        .bytes(Bytes::from_static(b"{\"name\": \"Jane\""))
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let server = server_with(
        Arc::new(MockLeadRepository::failing()),
        CrmRegistry::empty(),
        ApiConfig::default(),
    );

    let response = server.post("/api/leads").json(&SubmissionFixtures::json_body()).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Something went wrong while processing your request");
}

#[tokio::test]
async fn test_crm_failure_does_not_fail_submission() {
    let hubspot = FakeHubSpot::start().await;
    let close = FakeClose::start().await;
    let registry = registry_for(
        Some(hubspot_config(&hubspot, "pat-wrong-token")),
        Some(close_config(&close)),
    );
    let server = server_with(Arc::new(InMemoryLeadRepository::new()), registry, ApiConfig::default());

    let response = server.post("/api/leads").json(&SubmissionFixtures::json_body()).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["integrations"]["hubspot"]["success"], false);
    assert!(body["integrations"]["hubspot"]["error"]
        .as_str()
        .unwrap()
        .starts_with("Unauthorized"));

    let close_lead = &close.leads()[0];
    assert_eq!(body["integrations"]["close"]["success"], true);
    assert_eq!(body["integrations"]["close"]["isNew"], true);
    assert_eq!(body["integrations"]["close"]["remoteId"], close_lead.id.as_str());
    assert!(hubspot.contacts().is_empty());

    let list: Value = server.get("/api/leads").await.json();
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn test_only_configured_crm_is_reported() {
    let hubspot = FakeHubSpot::start().await;
    let registry = registry_for(Some(hubspot_config(&hubspot, &hubspot.token())), None);
    let server = server_with(Arc::new(InMemoryLeadRepository::new()), registry, ApiConfig::default());

    let body: Value = server
        .post("/api/leads")
        .json(&SubmissionFixtures::json_body())
        .await
        .json();

    assert_eq!(body["integrations"]["hubspot"]["success"], true);
    assert!(body["integrations"].get("close").is_none());
    assert_eq!(hubspot.contacts_with_email("kai@guildhall.gg").len(), 1);
}

// ============================================================================
// CRM status
// ============================================================================

#[tokio::test]
async fn test_status_when_not_configured() {
    let server = local_only_server();

    let hubspot: Value = server.get("/api/hubspot/status").await.json();
    assert_eq!(hubspot["configured"], false);
    assert_eq!(hubspot["connected"], false);
    assert_eq!(hubspot["message"], "HubSpot API key not configured");

    let close: Value = server.get("/api/close/status").await.json();
    assert_eq!(close["configured"], false);
    assert_eq!(close["message"], "Close.com API key not configured");
}

#[tokio::test]
async fn test_status_when_connected() {
    let hubspot = FakeHubSpot::start().await;
    hubspot.seed_contact("existing@example.com");
    let close = FakeClose::start().await;
    close.seed_lead("Acme Guild", Some("owner@acme.gg"));

    let registry = registry_for(
        Some(hubspot_config(&hubspot, &hubspot.token())),
        Some(close_config(&close)),
    );
    let server = server_with(Arc::new(InMemoryLeadRepository::new()), registry, ApiConfig::default());

    let status: Value = server.get("/api/hubspot/status").await.json();
    assert_eq!(status["connected"], true);
    assert_eq!(status["portalId"], "24681357");
    assert_eq!(status["stats"]["contacts"], 1);

    let status: Value = server.get("/api/close/status").await.json();
    assert_eq!(status["connected"], true);
    assert_eq!(status["organization"], "Aura Forge");
    assert_eq!(status["stats"]["leads"], 1);
}

#[tokio::test]
async fn test_status_reports_bad_credentials_as_disconnected() {
    let hubspot = FakeHubSpot::start().await;
    let registry = registry_for(Some(hubspot_config(&hubspot, "pat-wrong-token")), None);
    let server = server_with(Arc::new(InMemoryLeadRepository::new()), registry, ApiConfig::default());

    let response = server.get("/api/hubspot/status").await;
    response.assert_status_ok();

    let status: Value = response.json();
    assert_eq!(status["configured"], true);
    assert_eq!(status["connected"], false);
}

// ============================================================================
// CRM test endpoints
// ============================================================================

#[tokio::test]
async fn test_crm_test_endpoints_hidden_by_default() {
    let server = local_only_server();

    server.post("/api/hubspot/test").await.assert_status(StatusCode::NOT_FOUND);
    server.post("/api/close/test").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_crm_test_endpoint_requires_credentials() {
    let server = server_with(
        Arc::new(InMemoryLeadRepository::new()),
        CrmRegistry::empty(),
        with_test_endpoints(),
    );

    let response = server.post("/api/close/test").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "Close.com API key not configured");
}

#[tokio::test]
async fn test_crm_test_endpoint_pushes_synthetic_lead() {
    let close = FakeClose::start().await;
    let registry = registry_for(None, Some(close_config(&close)));
    let server = server_with(Arc::new(InMemoryLeadRepository::new()), registry, with_test_endpoints());

    let response = server.post("/api/close/test").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["email"].as_str().unwrap().starts_with("test+"));
    assert_eq!(close.leads()[0].name, "Test Lead");

    // Not stored locally
    let list: Value = server.get("/api/leads").await.json();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_crm_test_endpoint_surfaces_crm_error() {
    let hubspot = FakeHubSpot::start().await;
    let registry = registry_for(Some(hubspot_config(&hubspot, "pat-wrong-token")), None);
    let server = server_with(Arc::new(InMemoryLeadRepository::new()), registry, with_test_endpoints());

    let response = server.post("/api/hubspot/test").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

// ============================================================================
// Health and middleware
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let close = FakeClose::start().await;
    let server = server_with(
        Arc::new(InMemoryLeadRepository::new()),
        registry_for(None, Some(close_config(&close))),
        ApiConfig::default(),
    );

    let health: Value = server.get("/health").await.json();
    assert_eq!(health["status"], "healthy");

    let response = server.get("/health/ready").await;
    response.assert_status_ok();
    let ready: Value = response.json();
    assert_eq!(ready["status"], "ready");
    assert_eq!(ready["crm_integrations"], json!(["close"]));
    assert_eq!(ready["store"]["adapter_id"], "in-memory-lead-store");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = local_only_server();

    let response = server.get("/api/leads").await;
    assert!(response.headers().get("x-request-id").is_some());
}
