//! Ballot viewing endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use ballot_common::AppResult;
use ballot_core::election_accepts_votes;
use ballot_db::entities::{candidate, election, position};
use chrono::Utc;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// The ballot a voter sees for one election.
#[derive(Serialize)]
pub struct BallotResponse {
    pub election: ElectionSummary,
    pub accepting_votes: bool,
    pub positions: Vec<BallotPosition>,
}

#[derive(Serialize)]
pub struct ElectionSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub starts_at: Option<chrono::DateTime<Utc>>,
    pub ends_at: Option<chrono::DateTime<Utc>>,
}

impl From<election::Model> for ElectionSummary {
    fn from(e: election::Model) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            starts_at: e.starts_at,
            ends_at: e.ends_at,
        }
    }
}

#[derive(Serialize)]
pub struct BallotPosition {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub max_votes: i32,
    pub has_voted: bool,
    pub candidates: Vec<BallotCandidate>,
}

#[derive(Serialize)]
pub struct BallotCandidate {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<candidate::Model> for BallotCandidate {
    fn from(c: candidate::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            photo_url: c.photo_url,
            bio: c.bio,
        }
    }
}

/// Get the ballot for an election: its positions, the active candidates
/// for each, and which positions the caller has already voted for.
async fn show_ballot(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(election_id): Path<String>,
) -> AppResult<ApiResponse<BallotResponse>> {
    let election = state.election_service.get(&election_id).await?;
    let accepting_votes = election_accepts_votes(&election, state.clock.now());

    let positions = state.position_service.list_by_election(&election.id).await?;

    let mut ballot_positions = Vec::with_capacity(positions.len());
    for pos in positions {
        let candidates = state
            .candidate_service
            .list_active_by_position(&pos.id)
            .await?;
        let has_voted = state
            .voter_service
            .has_voted(&user.id, &election.id, &pos.id)
            .await?;

        ballot_positions.push(to_ballot_position(pos, candidates, has_voted));
    }

    Ok(ApiResponse::ok(BallotResponse {
        election: election.into(),
        accepting_votes,
        positions: ballot_positions,
    }))
}

fn to_ballot_position(
    pos: position::Model,
    candidates: Vec<candidate::Model>,
    has_voted: bool,
) -> BallotPosition {
    BallotPosition {
        id: pos.id,
        name: pos.name,
        description: pos.description,
        max_votes: pos.max_votes,
        has_voted,
        candidates: candidates.into_iter().map(Into::into).collect(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{election_id}", get(show_ballot))
}
