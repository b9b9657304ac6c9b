//! Voter registry.
//!
//! A voter profile is created lazily the first time a user casts a
//! ballot; admins can also toggle the `is_allowed` flag ahead of time.

use std::sync::Arc;

use ballot_common::{AppResult, Clock, IdGenerator};
use ballot_db::{
    entities::{user, voter},
    repositories::{AttendanceRepository, VoteRepository, VoterRepository},
};
use sea_orm::Set;

use crate::services::audit::{
    AuditEntry, AuditService, ChangeSet, RequestMeta, SubjectRef, snapshot,
};

/// Voter profile service.
#[derive(Clone)]
pub struct VoterService {
    voter_repo: VoterRepository,
    vote_repo: VoteRepository,
    attendance_repo: AttendanceRepository,
    audit: AuditService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl VoterService {
    /// Create a new voter service.
    #[must_use]
    pub fn new(
        voter_repo: VoterRepository,
        vote_repo: VoteRepository,
        attendance_repo: AttendanceRepository,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            voter_repo,
            vote_repo,
            attendance_repo,
            audit,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find the profile for a user, if one exists.
    pub async fn find_profile(&self, user_id: &str) -> AppResult<Option<voter::Model>> {
        self.voter_repo.find_by_user(user_id).await
    }

    /// Whether a user has already voted for a position in an election.
    pub async fn has_voted(
        &self,
        user_id: &str,
        election_id: &str,
        position_id: &str,
    ) -> AppResult<bool> {
        self.vote_repo
            .exists_for(election_id, position_id, user_id)
            .await
    }

    /// Number of ballots a user has cast in an election.
    pub async fn votes_in_election(&self, user_id: &str, election_id: &str) -> AppResult<u64> {
        self.vote_repo
            .count_by_voter_and_election(user_id, election_id)
            .await
    }

    /// Number of distinct voters who showed up for an election.
    pub async fn turnout(&self, election_id: &str) -> AppResult<u64> {
        self.attendance_repo.count_by_election(election_id).await
    }

    /// Set the `is_allowed` flag on a user's profile, creating the
    /// profile if none exists yet.
    pub async fn set_allowed(
        &self,
        target: &user::Model,
        allowed: bool,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<voter::Model> {
        let now = self.clock.now();

        let saved = if let Some(existing) = self.voter_repo.find_by_user(&target.id).await? {
            if existing.is_allowed == allowed {
                return Ok(existing);
            }
            let before = snapshot(&existing)?;

            let mut model: voter::ActiveModel = existing.into();
            model.is_allowed = Set(allowed);
            model.updated_at = Set(Some(now));
            let saved = self.voter_repo.update(model).await?;

            self.audit
                .record(
                    AuditEntry {
                        action: "voter.updated",
                        title: "Voter eligibility changed".to_string(),
                        description: format!(
                            "Set voting eligibility for \"{}\" to {allowed}",
                            target.username
                        ),
                        subject: Some(SubjectRef::Voter(&saved.id)),
                        changes: Some(ChangeSet::Updated {
                            before,
                            after: snapshot(&saved)?,
                        }),
                    },
                    Some(actor),
                    meta,
                )
                .await?;

            saved
        } else {
            let model = voter::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(target.id.clone()),
                is_allowed: Set(allowed),
                times_voted: Set(0),
                created_at: Set(now),
                updated_at: Set(None),
            };
            let saved = self.voter_repo.create(model).await?;

            self.audit
                .record(
                    AuditEntry {
                        action: "voter.updated",
                        title: "Voter registered".to_string(),
                        description: format!(
                            "Registered \"{}\" as a voter (allowed: {allowed})",
                            target.username
                        ),
                        subject: Some(SubjectRef::Voter(&saved.id)),
                        changes: Some(ChangeSet::Created {
                            attributes: snapshot(&saved)?,
                        }),
                    },
                    Some(actor),
                    meta,
                )
                .await?;

            saved
        };

        Ok(saved)
    }
}
