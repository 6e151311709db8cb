//! Intake service tests against mock store and mock CRM adapters

use std::sync::{Arc, Mutex};
use std::time::Duration;

use domain_lead::{
    AdapterResult, CrmAdapter, CrmProvider, LeadError, LeadIntakeService, LeadRepository,
    MockBehaviour, MockCrmAdapter, MockLeadRepository,
};
use test_utils::{
    assert_failed, assert_field_error, assert_skipped, assert_synced, SubmissionFixtures,
    TestLeadBuilder,
};

fn service_with(
    repository: Arc<MockLeadRepository>,
    adapters: Vec<Arc<MockCrmAdapter>>,
) -> LeadIntakeService {
    let adapters: Vec<Arc<dyn CrmAdapter>> = adapters
        .into_iter()
        .map(|a| a as Arc<dyn CrmAdapter>)
        .collect();
    LeadIntakeService::new(repository, adapters)
}

#[tokio::test]
async fn test_valid_submission_is_stored_and_synced_everywhere() {
    let repository = Arc::new(MockLeadRepository::new());
    let hubspot = Arc::new(MockCrmAdapter::new(CrmProvider::HubSpot, MockBehaviour::Create));
    let close = Arc::new(MockCrmAdapter::new(CrmProvider::Close, MockBehaviour::Update));
    let service = service_with(repository.clone(), vec![hubspot.clone(), close.clone()]);

    let receipt = service.submit(SubmissionFixtures::valid()).await.unwrap();

    assert_eq!(repository.len().await, 1);
    assert_eq!(receipt.lead.email, "jane@example.com");
    let remote_id = assert_synced(&receipt, CrmProvider::HubSpot, true);
    assert!(remote_id.starts_with("hubspot-"));
    assert_synced(&receipt, CrmProvider::Close, false);
    assert_eq!(hubspot.called_emails(), vec!["jane@example.com"]);
    assert_eq!(close.call_count(), 1);
}

#[tokio::test]
async fn test_invalid_submission_has_no_side_effects() {
    let repository = Arc::new(MockLeadRepository::new());
    let hubspot = Arc::new(MockCrmAdapter::new(CrmProvider::HubSpot, MockBehaviour::Create));
    let service = service_with(repository.clone(), vec![hubspot.clone()]);

    let err = service.submit(SubmissionFixtures::invalid()).await.unwrap_err();

    let errors = err.field_errors().expect("validation error");
    assert_field_error(errors, "name", "Name must be at least 2 characters");
    assert_field_error(errors, "email", "Please enter a valid email address");
    assert_eq!(repository.write_attempts(), 0);
    assert_eq!(hubspot.call_count(), 0);
}

#[tokio::test]
async fn test_store_failure_skips_every_crm() {
    let repository = Arc::new(MockLeadRepository::failing());
    let hubspot = Arc::new(MockCrmAdapter::new(CrmProvider::HubSpot, MockBehaviour::Create));
    let close = Arc::new(MockCrmAdapter::new(CrmProvider::Close, MockBehaviour::Create));
    let service = service_with(repository.clone(), vec![hubspot.clone(), close.clone()]);

    let err = service.submit(SubmissionFixtures::valid()).await.unwrap_err();

    assert!(matches!(err, LeadError::Storage(_)));
    assert_eq!(repository.write_attempts(), 1);
    assert_eq!(hubspot.call_count(), 0);
    assert_eq!(close.call_count(), 0);
}

#[tokio::test]
async fn test_failing_crm_does_not_stop_the_next_one() {
    let repository = Arc::new(MockLeadRepository::new());
    let hubspot = Arc::new(MockCrmAdapter::new(
        CrmProvider::HubSpot,
        MockBehaviour::Fail("Property values were not valid".to_string()),
    ));
    let close = Arc::new(MockCrmAdapter::new(CrmProvider::Close, MockBehaviour::Create));
    let service = service_with(repository.clone(), vec![hubspot, close.clone()]);

    let receipt = service.submit(SubmissionFixtures::valid()).await.unwrap();

    let reason = assert_failed(&receipt, CrmProvider::HubSpot);
    assert_eq!(reason, "HubSpot error (500): Property values were not valid");
    assert_synced(&receipt, CrmProvider::Close, true);
    assert_eq!(repository.len().await, 1);
}

#[tokio::test]
async fn test_adapters_run_in_provider_order_regardless_of_registration() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let close = Arc::new(
        MockCrmAdapter::new(CrmProvider::Close, MockBehaviour::Create).with_journal(journal.clone()),
    );
    let hubspot = Arc::new(
        MockCrmAdapter::new(CrmProvider::HubSpot, MockBehaviour::Create).with_journal(journal.clone()),
    );
    let service = service_with(Arc::new(MockLeadRepository::new()), vec![close, hubspot]);

    service.submit(SubmissionFixtures::valid()).await.unwrap();

    assert_eq!(*journal.lock().unwrap(), vec![CrmProvider::HubSpot, CrmProvider::Close]);
}

#[tokio::test]
async fn test_only_configured_provider_is_attempted() {
    let close = Arc::new(MockCrmAdapter::new(CrmProvider::Close, MockBehaviour::Create));
    let service = service_with(Arc::new(MockLeadRepository::new()), vec![close]);

    let receipt = service.submit(SubmissionFixtures::valid()).await.unwrap();

    assert_skipped(&receipt, CrmProvider::HubSpot);
    let attempted: Vec<_> = receipt.attempted().map(|o| o.provider).collect();
    assert_eq!(attempted, vec![CrmProvider::Close]);
    assert_eq!(service.configured_providers(), vec![CrmProvider::Close]);
}

#[tokio::test]
async fn test_slow_crm_times_out_and_next_still_runs() {
    let hubspot = Arc::new(MockCrmAdapter::new(
        CrmProvider::HubSpot,
        MockBehaviour::Hang(Duration::from_secs(5)),
    ));
    let close = Arc::new(MockCrmAdapter::new(CrmProvider::Close, MockBehaviour::Create));
    let service = service_with(Arc::new(MockLeadRepository::new()), vec![hubspot, close.clone()])
        .with_adapter_timeout(Duration::from_millis(50));

    let receipt = service.submit(SubmissionFixtures::valid()).await.unwrap();

    let reason = assert_failed(&receipt, CrmProvider::HubSpot);
    assert!(reason.contains("did not respond within 50ms"), "{}", reason);
    assert_synced(&receipt, CrmProvider::Close, true);
    assert_eq!(close.call_count(), 1);
}

#[tokio::test]
async fn test_submissions_are_normalized_before_storage() {
    let repository = Arc::new(MockLeadRepository::new());
    let service = service_with(repository.clone(), Vec::new());

    let submission = TestLeadBuilder::new()
        .with_name("  Jane Doe  ")
        .with_phone("   ")
        .with_discord(" jane#0001 ")
        .build_submission();
    let receipt = service.submit(submission).await.unwrap();

    assert_eq!(receipt.lead.name, "Jane Doe");
    assert_eq!(receipt.lead.phone, None);
    assert_eq!(receipt.lead.discord_username.as_deref(), Some("jane#0001"));

    let stored = repository.get_all_leads().await.unwrap();
    assert_eq!(stored, vec![receipt.lead.clone()]);
}

#[tokio::test]
async fn test_list_leads_propagates_store_errors() {
    let service = service_with(Arc::new(MockLeadRepository::failing()), Vec::new());
    assert!(matches!(service.list_leads().await, Err(LeadError::Storage(_))));
}

#[tokio::test]
async fn test_every_provider_has_an_outcome() {
    let service = service_with(Arc::new(MockLeadRepository::new()), Vec::new());
    let receipt = service.submit(SubmissionFixtures::valid()).await.unwrap();

    let providers: Vec<_> = receipt.integrations.iter().map(|o| o.provider).collect();
    assert_eq!(providers, CrmProvider::ALL.to_vec());
    assert!(receipt.integrations.iter().all(|o| o.result == AdapterResult::Skipped));
}
