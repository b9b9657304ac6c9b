//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body, extract::State, http::Request, middleware::Next, response::Response,
};
use ballot_common::Clock;
use ballot_core::{
    AuditService, CandidateService, ElectionService, PositionService, UserService, VoterService,
    VotingService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub voting_service: VotingService,
    pub election_service: ElectionService,
    pub position_service: PositionService,
    pub candidate_service: CandidateService,
    pub voter_service: VoterService,
    pub audit_service: AuditService,
    pub clock: Arc<dyn Clock>,
}

/// Authentication middleware. Resolves a bearer token to a user and
/// stashes the model in request extensions for the extractors.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
