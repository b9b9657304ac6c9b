//! HTTP API layer for ballotbox.
//!
//! - **Endpoints**: ballot viewing, vote casting, admin CRUD
//! - **Extractors**: authentication, client metadata
//! - **Middleware**: token resolution, request logging
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
