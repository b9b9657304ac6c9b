//! Audit log endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use ballot_common::AppResult;
use ballot_db::entities::audit_log;
use serde::{Deserialize, Serialize};

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    pub action: Option<String>,
}

const fn default_limit() -> u64 {
    50
}

#[derive(Serialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<audit_log::Model> for AuditLogResponse {
    fn from(entry: audit_log::Model) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            title: entry.title,
            description: entry.description,
            user_id: entry.user_id,
            user_name: entry.user_name,
            subject_type: entry.subject_type,
            subject_id: entry.subject_id,
            changes: entry.changes,
            ip_address: entry.ip_address,
            created_at: entry.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct AuditLogListResponse {
    pub entries: Vec<AuditLogResponse>,
    pub total: u64,
}

/// List audit entries, newest first.
async fn list_audit_logs(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<AuditLogListResponse>> {
    let limit = query.limit.min(200);

    let entries = if let Some(ref action) = query.action {
        state
            .audit_service
            .list_by_action(action, limit, query.offset)
            .await?
    } else {
        state.audit_service.list(limit, query.offset).await?
    };
    let total = state.audit_service.count().await?;

    Ok(ApiResponse::ok(AuditLogListResponse {
        entries: entries.into_iter().map(Into::into).collect(),
        total,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/audit-logs", get(list_audit_logs))
}
