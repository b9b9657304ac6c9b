//! Position administration endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use ballot_common::AppResult;
use ballot_core::PositionInput;
use ballot_db::entities::position;
use serde::Serialize;

use crate::{
    extractors::{AdminUser, ClientMeta},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

#[derive(Serialize)]
pub struct PositionResponse {
    pub id: String,
    pub election_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub max_votes: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<position::Model> for PositionResponse {
    fn from(p: position::Model) -> Self {
        Self {
            id: p.id,
            election_id: p.election_id,
            name: p.name,
            description: p.description,
            max_votes: p.max_votes,
            created_at: p.created_at,
        }
    }
}

/// List positions in an election.
async fn list_positions(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(election_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PositionResponse>>> {
    let positions = state.position_service.list_by_election(&election_id).await?;
    Ok(ApiResponse::ok(
        positions.into_iter().map(Into::into).collect(),
    ))
}

/// Create a position under an election.
async fn create_position(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(election_id): Path<String>,
    Json(input): Json<PositionInput>,
) -> AppResult<ApiResponse<PositionResponse>> {
    let position = state
        .position_service
        .create(&election_id, input, &admin, &meta)
        .await?;
    Ok(ApiResponse::ok(position.into()))
}

/// Update a position.
async fn update_position(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PositionInput>,
) -> AppResult<ApiResponse<PositionResponse>> {
    let position = state
        .position_service
        .update(&id, input, &admin, &meta)
        .await?;
    Ok(ApiResponse::ok(position.into()))
}

/// Delete a position.
async fn delete_position(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.position_service.delete(&id, &admin, &meta).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/elections/{id}/positions", get(list_positions))
        .route("/elections/{id}/positions", post(create_position))
        .route("/positions/{id}", put(update_position))
        .route("/positions/{id}", delete(delete_position))
}
