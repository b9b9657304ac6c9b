//! Candidate administration endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use ballot_common::AppResult;
use ballot_core::CandidateInput;
use ballot_db::entities::candidate::{self, CandidateStatus};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, ClientMeta},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

#[derive(Serialize)]
pub struct CandidateResponse {
    pub id: String,
    pub position_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub status: CandidateStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<candidate::Model> for CandidateResponse {
    fn from(c: candidate::Model) -> Self {
        Self {
            id: c.id,
            position_id: c.position_id,
            name: c.name,
            photo_url: c.photo_url,
            bio: c.bio,
            status: c.status,
            created_at: c.created_at,
        }
    }
}

/// List candidates for a position, inactive ones included.
async fn list_candidates(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(position_id): Path<String>,
) -> AppResult<ApiResponse<Vec<CandidateResponse>>> {
    let candidates = state
        .candidate_service
        .list_by_position(&position_id)
        .await?;
    Ok(ApiResponse::ok(
        candidates.into_iter().map(Into::into).collect(),
    ))
}

/// Create a candidate under a position.
async fn create_candidate(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(position_id): Path<String>,
    Json(input): Json<CandidateInput>,
) -> AppResult<ApiResponse<CandidateResponse>> {
    let candidate = state
        .candidate_service
        .create(&position_id, input, &admin, &meta)
        .await?;
    Ok(ApiResponse::ok(candidate.into()))
}

/// Update a candidate.
async fn update_candidate(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CandidateInput>,
) -> AppResult<ApiResponse<CandidateResponse>> {
    let candidate = state
        .candidate_service
        .update(&id, input, &admin, &meta)
        .await?;
    Ok(ApiResponse::ok(candidate.into()))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: CandidateStatus,
}

/// Change a candidate's ballot visibility.
async fn set_candidate_status(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<ApiResponse<CandidateResponse>> {
    let candidate = state
        .candidate_service
        .set_status(&id, req.status, &admin, &meta)
        .await?;
    Ok(ApiResponse::ok(candidate.into()))
}

/// Delete a candidate.
async fn delete_candidate(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.candidate_service.delete(&id, &admin, &meta).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/positions/{id}/candidates", get(list_candidates))
        .route("/positions/{id}/candidates", post(create_candidate))
        .route("/candidates/{id}", put(update_candidate))
        .route("/candidates/{id}/status", patch(set_candidate_status))
        .route("/candidates/{id}", delete(delete_candidate))
}
