//! Audit trail.
//!
//! Administrative mutations append one row here describing who did what
//! to which record. Ballot casting deliberately does not: a per-vote
//! audit row would tie a voter to a choice, and the vote table plus the
//! attendance table already carry everything tallies need.

use std::sync::Arc;

use ballot_common::{AppError, AppResult, Clock, IdGenerator};
use ballot_db::{
    entities::{audit_log, user},
    repositories::AuditLogRepository,
};
use sea_orm::Set;
use serde_json::Value as JsonValue;

/// What kind of record an audit entry refers to. Closed set; adding a
/// new subject kind is a deliberate schema decision, not a string typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectRef<'a> {
    Election(&'a str),
    Position(&'a str),
    Candidate(&'a str),
    Voter(&'a str),
    User(&'a str),
}

impl SubjectRef<'_> {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Election(_) => "election",
            Self::Position(_) => "position",
            Self::Candidate(_) => "candidate",
            Self::Voter(_) => "voter",
            Self::User(_) => "user",
        }
    }

    const fn id(&self) -> &str {
        match self {
            Self::Election(id)
            | Self::Position(id)
            | Self::Candidate(id)
            | Self::Voter(id)
            | Self::User(id) => id,
        }
    }
}

/// Record state attached to an entry, stored as JSON in the `changes`
/// column.
#[derive(Debug, Clone)]
pub enum ChangeSet {
    Created { attributes: JsonValue },
    Updated { before: JsonValue, after: JsonValue },
    Deleted { before: JsonValue },
}

impl ChangeSet {
    fn into_json(self) -> JsonValue {
        match self {
            Self::Created { attributes } => serde_json::json!({ "attributes": attributes }),
            Self::Updated { before, after } => {
                serde_json::json!({ "before": before, "after": after })
            }
            Self::Deleted { before } => serde_json::json!({ "before": before }),
        }
    }
}

/// Request-scoped metadata recorded alongside each entry.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One entry to append.
#[derive(Debug)]
pub struct AuditEntry<'a> {
    pub action: &'a str,
    pub title: String,
    pub description: String,
    pub subject: Option<SubjectRef<'a>>,
    pub changes: Option<ChangeSet>,
}

/// Append-only audit service.
#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditLogRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl AuditService {
    /// Create a new audit service.
    #[must_use]
    pub fn new(audit_repo: AuditLogRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            audit_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append one entry. Failures are surfaced to the caller; admin
    /// mutations treat the audit write as part of the operation.
    pub async fn record(
        &self,
        entry: AuditEntry<'_>,
        actor: Option<&user::Model>,
        meta: &RequestMeta,
    ) -> AppResult<audit_log::Model> {
        let model = audit_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            action: Set(entry.action.to_string()),
            title: Set(entry.title),
            description: Set(Some(entry.description)),
            user_id: Set(actor.map(|u| u.id.clone())),
            user_name: Set(actor.map(display_name)),
            subject_type: Set(entry.subject.map(|s| s.type_name().to_string())),
            subject_id: Set(entry.subject.map(|s| s.id().to_string())),
            changes: Set(entry.changes.map(ChangeSet::into_json)),
            ip_address: Set(meta.ip_address.clone()),
            user_agent: Set(meta.user_agent.clone()),
            created_at: Set(self.clock.now()),
        };

        let saved = self.audit_repo.create(model).await?;

        tracing::debug!(
            action = %saved.action,
            subject_type = ?saved.subject_type,
            subject_id = ?saved.subject_id,
            "Audit entry recorded"
        );

        Ok(saved)
    }

    /// List entries, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<audit_log::Model>> {
        self.audit_repo.list(limit, offset).await
    }

    /// List entries for one action, newest first.
    pub async fn list_by_action(
        &self,
        action: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<audit_log::Model>> {
        self.audit_repo.list_by_action(action, limit, offset).await
    }

    /// Total number of entries.
    pub async fn count(&self) -> AppResult<u64> {
        self.audit_repo.count().await
    }
}

fn display_name(actor: &user::Model) -> String {
    actor.name.clone().unwrap_or_else(|| actor.username.clone())
}

/// Serialize a record for a [`ChangeSet`] snapshot.
pub fn snapshot<T: serde::Serialize>(model: &T) -> AppResult<JsonValue> {
    serde_json::to_value(model).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subject_ref_carries_type_and_id() {
        let subject = SubjectRef::Election("e1");
        assert_eq!(subject.type_name(), "election");
        assert_eq!(subject.id(), "e1");

        let subject = SubjectRef::Candidate("c9");
        assert_eq!(subject.type_name(), "candidate");
        assert_eq!(subject.id(), "c9");
    }

    #[test]
    fn test_change_set_created_shape() {
        let json = ChangeSet::Created {
            attributes: json!({ "title": "New" }),
        }
        .into_json();
        assert_eq!(json, json!({ "attributes": { "title": "New" } }));
    }

    #[test]
    fn test_change_set_updated_shape() {
        let json = ChangeSet::Updated {
            before: json!({ "title": "Old" }),
            after: json!({ "title": "New" }),
        }
        .into_json();
        assert_eq!(
            json,
            json!({ "before": { "title": "Old" }, "after": { "title": "New" } })
        );
    }

    #[test]
    fn test_change_set_deleted_shape() {
        let json = ChangeSet::Deleted {
            before: json!({ "title": "Gone" }),
        }
        .into_json();
        assert_eq!(json, json!({ "before": { "title": "Gone" } }));
    }
}
