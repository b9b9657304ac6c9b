//! Candidate management.

use std::sync::Arc;

use ballot_common::{AppResult, Clock, IdGenerator};
use ballot_db::{
    entities::{
        candidate::{self, CandidateStatus},
        user,
    },
    repositories::{CandidateRepository, PositionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::audit::{
    AuditEntry, AuditService, ChangeSet, RequestMeta, SubjectRef, snapshot,
};

/// Input for creating or updating a candidate.
#[derive(Debug, Deserialize, Validate)]
pub struct CandidateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(url)]
    pub photo_url: Option<String>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,

    #[serde(default = "default_status")]
    pub status: CandidateStatus,
}

const fn default_status() -> CandidateStatus {
    CandidateStatus::Active
}

/// Candidate service for admin CRUD.
#[derive(Clone)]
pub struct CandidateService {
    candidate_repo: CandidateRepository,
    position_repo: PositionRepository,
    audit: AuditService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl CandidateService {
    /// Create a new candidate service.
    #[must_use]
    pub fn new(
        candidate_repo: CandidateRepository,
        position_repo: PositionRepository,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            candidate_repo,
            position_repo,
            audit,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a candidate by ID.
    pub async fn get(&self, id: &str) -> AppResult<candidate::Model> {
        self.candidate_repo.get_by_id(id).await
    }

    /// List all candidates for a position, including inactive ones.
    pub async fn list_by_position(&self, position_id: &str) -> AppResult<Vec<candidate::Model>> {
        self.candidate_repo.list_by_position(position_id).await
    }

    /// List only the candidates offered to voters.
    pub async fn list_active_by_position(
        &self,
        position_id: &str,
    ) -> AppResult<Vec<candidate::Model>> {
        self.candidate_repo.list_active_by_position(position_id).await
    }

    /// Create a candidate under a position.
    pub async fn create(
        &self,
        position_id: &str,
        input: CandidateInput,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<candidate::Model> {
        input.validate()?;

        let position = self.position_repo.get_by_id(position_id).await?;

        let model = candidate::ActiveModel {
            id: Set(self.id_gen.generate()),
            position_id: Set(position.id.clone()),
            name: Set(input.name),
            photo_url: Set(input.photo_url),
            bio: Set(input.bio),
            status: Set(input.status),
            created_at: Set(self.clock.now()),
            updated_at: Set(None),
        };

        let saved = self.candidate_repo.create(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "candidate.created",
                    title: "Candidate created".to_string(),
                    description: format!(
                        "Created candidate \"{}\" for position \"{}\"",
                        saved.name, position.name
                    ),
                    subject: Some(SubjectRef::Candidate(&saved.id)),
                    changes: Some(ChangeSet::Created {
                        attributes: snapshot(&saved)?,
                    }),
                },
                Some(actor),
                meta,
            )
            .await?;

        Ok(saved)
    }

    /// Update a candidate.
    pub async fn update(
        &self,
        id: &str,
        input: CandidateInput,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<candidate::Model> {
        input.validate()?;

        let existing = self.candidate_repo.get_by_id(id).await?;
        let before = snapshot(&existing)?;

        let mut model: candidate::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.photo_url = Set(input.photo_url);
        model.bio = Set(input.bio);
        model.status = Set(input.status);
        model.updated_at = Set(Some(self.clock.now()));

        let saved = self.candidate_repo.update(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "candidate.updated",
                    title: "Candidate updated".to_string(),
                    description: format!("Updated candidate \"{}\"", saved.name),
                    subject: Some(SubjectRef::Candidate(&saved.id)),
                    changes: Some(ChangeSet::Updated {
                        before,
                        after: snapshot(&saved)?,
                    }),
                },
                Some(actor),
                meta,
            )
            .await?;

        Ok(saved)
    }

    /// Flip a candidate's visibility on the ballot.
    pub async fn set_status(
        &self,
        id: &str,
        status: CandidateStatus,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<candidate::Model> {
        let existing = self.candidate_repo.get_by_id(id).await?;
        if existing.status == status {
            return Ok(existing);
        }
        let before = snapshot(&existing)?;

        let mut model: candidate::ActiveModel = existing.into();
        model.status = Set(status);
        model.updated_at = Set(Some(self.clock.now()));

        let saved = self.candidate_repo.update(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "candidate.status_changed",
                    title: "Candidate status changed".to_string(),
                    description: format!("Changed status of candidate \"{}\"", saved.name),
                    subject: Some(SubjectRef::Candidate(&saved.id)),
                    changes: Some(ChangeSet::Updated {
                        before,
                        after: snapshot(&saved)?,
                    }),
                },
                Some(actor),
                meta,
            )
            .await?;

        Ok(saved)
    }

    /// Delete a candidate. Existing votes referencing it go with it.
    pub async fn delete(
        &self,
        id: &str,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<()> {
        let existing = self.candidate_repo.get_by_id(id).await?;
        let before = snapshot(&existing)?;
        self.candidate_repo.delete(id).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "candidate.deleted",
                    title: "Candidate deleted".to_string(),
                    description: format!("Deleted candidate \"{}\"", existing.name),
                    subject: Some(SubjectRef::Candidate(id)),
                    changes: Some(ChangeSet::Deleted { before }),
                },
                Some(actor),
                meta,
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults_to_active() {
        let input: CandidateInput =
            serde_json::from_value(serde_json::json!({ "name": "Jamie Rivers" }))
                .expect("valid input");
        assert_eq!(input.status, CandidateStatus::Active);
    }

    #[test]
    fn test_input_rejects_malformed_photo_url() {
        let input = CandidateInput {
            name: "Jamie Rivers".to_string(),
            photo_url: Some("not a url".to_string()),
            bio: None,
            status: CandidateStatus::Active,
        };
        assert!(input.validate().is_err());
    }
}
