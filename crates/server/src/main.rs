//! Ballotbox server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use ballot_api::{middleware::AppState, router as api_router};
use ballot_common::{Clock, Config, SystemClock};
use ballot_core::{
    AuditService, CandidateService, ElectionService, PositionService, UserService, VoterService,
    VotingService,
};
use ballot_db::repositories::{
    AttendanceRepository, AuditLogRepository, CandidateRepository, ElectionRepository,
    PositionRepository, UserRepository, VoteRepository, VoterRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballot=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting ballotbox server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = ballot_db::init(&config).await?;

    // Run migrations
    info!("Running database migrations...");
    ballot_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let election_repo = ElectionRepository::new(Arc::clone(&db));
    let position_repo = PositionRepository::new(Arc::clone(&db));
    let candidate_repo = CandidateRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let voter_repo = VoterRepository::new(Arc::clone(&db));
    let attendance_repo = AttendanceRepository::new(Arc::clone(&db));
    let audit_repo = AuditLogRepository::new(Arc::clone(&db));

    // Initialize services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let audit_service = AuditService::new(audit_repo, Arc::clone(&clock));

    let state = AppState {
        user_service: UserService::new(user_repo),
        voting_service: VotingService::new(
            Arc::clone(&db),
            candidate_repo.clone(),
            position_repo.clone(),
            election_repo.clone(),
            vote_repo.clone(),
            Arc::clone(&clock),
        ),
        election_service: ElectionService::new(
            election_repo.clone(),
            audit_service.clone(),
            Arc::clone(&clock),
        ),
        position_service: PositionService::new(
            position_repo.clone(),
            election_repo,
            audit_service.clone(),
            Arc::clone(&clock),
        ),
        candidate_service: CandidateService::new(
            candidate_repo,
            position_repo,
            audit_service.clone(),
            Arc::clone(&clock),
        ),
        voter_service: VoterService::new(
            voter_repo,
            vote_repo,
            attendance_repo,
            audit_service.clone(),
            Arc::clone(&clock),
        ),
        audit_service,
        clock,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ballot_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
