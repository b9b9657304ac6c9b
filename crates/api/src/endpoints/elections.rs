//! Election administration endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use ballot_common::AppResult;
use ballot_core::{ElectionInput, ElectionStatus};
use ballot_db::entities::election;
use serde::Serialize;

use crate::{
    extractors::{AdminUser, ClientMeta},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Election as shown on admin listings.
#[derive(Serialize)]
pub struct ElectionResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub status: ElectionStatus,
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ElectionResponse {
    fn from_model(e: election::Model, status: ElectionStatus) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            is_active: e.is_active,
            status,
            starts_at: e.starts_at,
            ends_at: e.ends_at,
            created_at: e.created_at,
        }
    }
}

/// List elections, newest first.
async fn list_elections(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ElectionResponse>>> {
    let elections = state.election_service.list().await?;
    Ok(ApiResponse::ok(
        elections
            .into_iter()
            .map(|(e, status)| ElectionResponse::from_model(e, status))
            .collect(),
    ))
}

/// Show one election.
async fn show_election(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ElectionResponse>> {
    let election = state.election_service.get(&id).await?;
    let status = ElectionStatus::of(&election, state.clock.now());
    Ok(ApiResponse::ok(ElectionResponse::from_model(
        election, status,
    )))
}

/// Create an election.
async fn create_election(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Json(input): Json<ElectionInput>,
) -> AppResult<ApiResponse<ElectionResponse>> {
    let election = state.election_service.create(input, &admin, &meta).await?;
    let status = ElectionStatus::of(&election, state.clock.now());
    Ok(ApiResponse::ok(ElectionResponse::from_model(
        election, status,
    )))
}

/// Update an election.
async fn update_election(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ElectionInput>,
) -> AppResult<ApiResponse<ElectionResponse>> {
    let election = state
        .election_service
        .update(&id, input, &admin, &meta)
        .await?;
    let status = ElectionStatus::of(&election, state.clock.now());
    Ok(ApiResponse::ok(ElectionResponse::from_model(
        election, status,
    )))
}

/// Delete an election.
async fn delete_election(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.election_service.delete(&id, &admin, &meta).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/elections", get(list_elections))
        .route("/elections", post(create_election))
        .route("/elections/{id}", get(show_election))
        .route("/elections/{id}", put(update_election))
        .route("/elections/{id}", delete(delete_election))
}
