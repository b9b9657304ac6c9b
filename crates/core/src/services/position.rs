//! Position management.

use std::sync::Arc;

use ballot_common::{AppResult, Clock, IdGenerator};
use ballot_db::{
    entities::{position, user},
    repositories::{ElectionRepository, PositionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::audit::{
    AuditEntry, AuditService, ChangeSet, RequestMeta, SubjectRef, snapshot,
};

/// Input for creating or updating a position.
#[derive(Debug, Deserialize, Validate)]
pub struct PositionInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// How many candidates a voter may pick for this seat.
    #[serde(default = "default_max_votes")]
    #[validate(range(min = 1, max = 100))]
    pub max_votes: i32,
}

const fn default_max_votes() -> i32 {
    1
}

/// Position service for admin CRUD.
#[derive(Clone)]
pub struct PositionService {
    position_repo: PositionRepository,
    election_repo: ElectionRepository,
    audit: AuditService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl PositionService {
    /// Create a new position service.
    #[must_use]
    pub fn new(
        position_repo: PositionRepository,
        election_repo: ElectionRepository,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            position_repo,
            election_repo,
            audit,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a position by ID.
    pub async fn get(&self, id: &str) -> AppResult<position::Model> {
        self.position_repo.get_by_id(id).await
    }

    /// List positions for an election.
    pub async fn list_by_election(&self, election_id: &str) -> AppResult<Vec<position::Model>> {
        self.position_repo.list_by_election(election_id).await
    }

    /// Create a position under an election.
    pub async fn create(
        &self,
        election_id: &str,
        input: PositionInput,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<position::Model> {
        input.validate()?;

        // Fail with NotFound before touching anything else.
        let election = self.election_repo.get_by_id(election_id).await?;

        let model = position::ActiveModel {
            id: Set(self.id_gen.generate()),
            election_id: Set(election.id.clone()),
            name: Set(input.name),
            description: Set(input.description),
            max_votes: Set(input.max_votes),
            created_at: Set(self.clock.now()),
            updated_at: Set(None),
        };

        let saved = self.position_repo.create(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "position.created",
                    title: "Position created".to_string(),
                    description: format!(
                        "Created position \"{}\" in election \"{}\"",
                        saved.name, election.title
                    ),
                    subject: Some(SubjectRef::Position(&saved.id)),
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

    /// Update a position.
    pub async fn update(
        &self,
        id: &str,
        input: PositionInput,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<position::Model> {
        input.validate()?;

        let existing = self.position_repo.get_by_id(id).await?;
        let before = snapshot(&existing)?;

        let mut model: position::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.description = Set(input.description);
        model.max_votes = Set(input.max_votes);
        model.updated_at = Set(Some(self.clock.now()));

        let saved = self.position_repo.update(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "position.updated",
                    title: "Position updated".to_string(),
                    description: format!("Updated position \"{}\"", saved.name),
                    subject: Some(SubjectRef::Position(&saved.id)),
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

    /// Delete a position along with its candidates and votes.
    pub async fn delete(
        &self,
        id: &str,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<()> {
        let existing = self.position_repo.get_by_id(id).await?;
        let before = snapshot(&existing)?;
        self.position_repo.delete(id).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "position.deleted",
                    title: "Position deleted".to_string(),
                    description: format!("Deleted position \"{}\"", existing.name),
                    subject: Some(SubjectRef::Position(id)),
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
    fn test_input_defaults_to_single_choice() {
        let input: PositionInput =
            serde_json::from_value(serde_json::json!({ "name": "President" }))
                .expect("valid input");
        assert_eq!(input.max_votes, 1);
    }

    #[test]
    fn test_input_rejects_zero_max_votes() {
        let input = PositionInput {
            name: "Senator".to_string(),
            description: None,
            max_votes: 0,
        };
        assert!(input.validate().is_err());
    }
}
