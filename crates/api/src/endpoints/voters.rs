//! Voter administration endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use ballot_common::AppResult;
use ballot_db::entities::voter;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, ClientMeta},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Serialize)]
pub struct VoterResponse {
    pub id: String,
    pub user_id: String,
    pub is_allowed: bool,
    pub times_voted: i32,
}

impl From<voter::Model> for VoterResponse {
    fn from(v: voter::Model) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            is_allowed: v.is_allowed,
            times_voted: v.times_voted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetAllowedRequest {
    pub allowed: bool,
}

#[derive(Serialize)]
pub struct TurnoutResponse {
    pub election_id: String,
    pub voters: u64,
}

/// Show a user's voter profile.
async fn show_voter(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Option<VoterResponse>>> {
    let profile = state.voter_service.find_profile(&user_id).await?;
    Ok(ApiResponse::ok(profile.map(Into::into)))
}

/// Set whether a user is allowed to vote.
async fn set_allowed(
    AdminUser(admin): AdminUser,
    ClientMeta(meta): ClientMeta,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SetAllowedRequest>,
) -> AppResult<ApiResponse<VoterResponse>> {
    let target = state.user_service.get(&user_id).await?;
    let profile = state
        .voter_service
        .set_allowed(&target, req.allowed, &admin, &meta)
        .await?;
    Ok(ApiResponse::ok(profile.into()))
}

/// Number of distinct voters who showed up for an election.
async fn turnout(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(election_id): Path<String>,
) -> AppResult<ApiResponse<TurnoutResponse>> {
    let voters = state.voter_service.turnout(&election_id).await?;
    Ok(ApiResponse::ok(TurnoutResponse {
        election_id,
        voters,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voters/{user_id}", get(show_voter))
        .route("/voters/{user_id}/allowed", put(set_allowed))
        .route("/elections/{id}/turnout", get(turnout))
}
