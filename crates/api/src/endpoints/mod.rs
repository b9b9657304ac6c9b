//! API endpoints.

mod audit_logs;
mod auth;
mod ballot;
mod candidates;
mod elections;
mod positions;
mod voters;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/ballot", ballot::router())
        .nest("/votes", votes::router())
        .nest("/admin", admin_router())
}

fn admin_router() -> Router<AppState> {
    Router::new()
        .merge(elections::router())
        .merge(positions::router())
        .merge(candidates::router())
        .merge(voters::router())
        .merge(audit_logs::router())
}
