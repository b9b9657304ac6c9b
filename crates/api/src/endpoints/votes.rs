//! Vote casting endpoints.

use axum::{Json, Router, extract::State, routing::post};
use ballot_common::{AppError, AppResult};
use ballot_core::{CastOutcome, VoteSelection};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

const BULK_RECORDED_MESSAGE: &str = "Your votes have been recorded.";

/// Single vote request.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub election_id: String,
    pub position_id: String,
    pub candidate_id: String,
}

/// Bulk vote request. All selections target one election.
#[derive(Debug, Deserialize)]
pub struct CastBulkRequest {
    pub election_id: String,
    pub votes: Vec<BulkSelection>,
}

#[derive(Debug, Deserialize)]
pub struct BulkSelection {
    pub position_id: String,
    pub candidate_id: String,
}

/// Outcome of a committed submission.
#[derive(Serialize)]
pub struct CastVoteResponse {
    pub election_id: String,
    pub votes_recorded: usize,
}

impl From<CastOutcome> for CastVoteResponse {
    fn from(outcome: CastOutcome) -> Self {
        Self {
            election_id: outcome.election_id,
            votes_recorded: outcome.votes_recorded,
        }
    }
}

fn ensure_can_vote(user: &ballot_db::entities::user::Model) -> AppResult<()> {
    if user.is_approved_student() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only approved students may vote".to_string(),
        ))
    }
}

/// Cast a single vote.
async fn cast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<CastVoteResponse>> {
    ensure_can_vote(&user)?;

    let outcome = state
        .voting_service
        .cast(
            &user,
            &req.election_id,
            VoteSelection {
                position_id: req.position_id,
                candidate_id: req.candidate_id,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        outcome.into(),
        "Your vote has been recorded.",
    ))
}

/// Cast votes for several positions at once.
async fn cast_bulk(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastBulkRequest>,
) -> AppResult<ApiResponse<CastVoteResponse>> {
    ensure_can_vote(&user)?;

    let selections: Vec<VoteSelection> = req
        .votes
        .into_iter()
        .map(|v| VoteSelection {
            position_id: v.position_id,
            candidate_id: v.candidate_id,
        })
        .collect();

    let outcome = state
        .voting_service
        .cast_bulk(&user, &req.election_id, &selections)
        .await?;

    // The bulk path always confirms in the plural, whatever the count
    Ok(ApiResponse::with_message(
        outcome.into(),
        BULK_RECORDED_MESSAGE,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cast))
        .route("/bulk", post(cast_bulk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_confirmation_is_always_plural() {
        assert_eq!(BULK_RECORDED_MESSAGE, "Your votes have been recorded.");
    }
}
