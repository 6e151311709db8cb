//! Lead handlers

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use tracing::error;

use domain_lead::LeadSubmission;

use crate::dto::lead::{LeadListResponse, SubmitLeadResponse};
use crate::{error::ApiError, AppState};

/// Accepts a lead form submission
///
/// Returns 201 whenever the lead was stored, whatever the CRMs made of it.
pub async fn submit_lead(
    State(state): State<AppState>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitLeadResponse>), ApiError> {
    let Json(submission) = payload?;
    let receipt = state.service.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(SubmitLeadResponse::from(receipt))))
}

/// Lists every stored lead
pub async fn list_leads(State(state): State<AppState>) -> Result<Json<LeadListResponse>, ApiError> {
    let leads = state.service.list_leads().await.map_err(|e| {
        error!(error = %e, "Failed to list leads");
        ApiError::Internal("Failed to retrieve leads".to_string())
    })?;
    Ok(Json(LeadListResponse::from(leads)))
}
