//! Election management.

use std::sync::Arc;

use ballot_common::{AppResult, Clock, IdGenerator};
use ballot_db::{
    entities::{election, user},
    repositories::ElectionRepository,
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::services::audit::{
    AuditEntry, AuditService, ChangeSet, RequestMeta, SubjectRef, snapshot,
};

/// Label shown on admin listings. This is presentational only; whether
/// an election actually accepts votes is decided solely by
/// [`crate::services::voting::election_accepts_votes`], and the two can
/// disagree (an `active` election whose start date is unset refuses
/// votes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    Upcoming,
    Active,
    Inactive,
    Ended,
}

impl ElectionStatus {
    /// Derive the display label for an election at `now`.
    ///
    /// After the upcoming/ended bound checks, the both-bounds-in-range
    /// arm defers to the flag, a second arm replays the acceptance rule
    /// for elections with a missing bound (an unset start counts as
    /// already started here), and anything left falls out as `ended`.
    /// The last two arms are redundant whenever both bounds are set;
    /// they only decide elections with an open-ended or unset schedule.
    #[must_use]
    pub fn of(election: &election::Model, now: DateTime<Utc>) -> Self {
        if election.starts_at.is_some_and(|starts_at| starts_at > now) {
            return Self::Upcoming;
        }
        if election.ends_at.is_some_and(|ends_at| ends_at < now) {
            return Self::Ended;
        }
        if let (Some(starts_at), Some(ends_at)) = (election.starts_at, election.ends_at)
            && starts_at <= now
            && ends_at >= now
        {
            return if election.is_active {
                Self::Active
            } else {
                Self::Inactive
            };
        }
        if election.is_active
            && election.starts_at.is_none_or(|starts_at| starts_at <= now)
            && election.ends_at.is_none_or(|ends_at| ends_at >= now)
        {
            return Self::Active;
        }
        Self::Ended
    }
}

/// Input for creating or updating an election.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_schedule))]
pub struct ElectionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[serde(default)]
    pub is_active: bool,

    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

fn validate_schedule(input: &ElectionInput) -> Result<(), ValidationError> {
    if let (Some(starts_at), Some(ends_at)) = (input.starts_at, input.ends_at)
        && ends_at <= starts_at
    {
        let mut err = ValidationError::new("schedule");
        err.message = Some("The end date must be after the start date.".into());
        return Err(err);
    }
    Ok(())
}

/// Election service for admin CRUD. Every mutation appends an audit
/// entry as part of the operation.
#[derive(Clone)]
pub struct ElectionService {
    election_repo: ElectionRepository,
    audit: AuditService,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl ElectionService {
    /// Create a new election service.
    #[must_use]
    pub fn new(
        election_repo: ElectionRepository,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            election_repo,
            audit,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get an election by ID.
    pub async fn get(&self, id: &str) -> AppResult<election::Model> {
        self.election_repo.get_by_id(id).await
    }

    /// List all elections, newest first, with their display status.
    pub async fn list(&self) -> AppResult<Vec<(election::Model, ElectionStatus)>> {
        let now = self.clock.now();
        let elections = self.election_repo.list().await?;
        Ok(elections
            .into_iter()
            .map(|e| {
                let status = ElectionStatus::of(&e, now);
                (e, status)
            })
            .collect())
    }

    /// Create an election.
    pub async fn create(
        &self,
        input: ElectionInput,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<election::Model> {
        input.validate()?;

        let now = self.clock.now();
        let model = election::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            is_active: Set(input.is_active),
            starts_at: Set(input.starts_at),
            ends_at: Set(input.ends_at),
            created_by: Set(Some(actor.id.clone())),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let saved = self.election_repo.create(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "election.created",
                    title: "Election created".to_string(),
                    description: format!("Created election \"{}\"", saved.title),
                    subject: Some(SubjectRef::Election(&saved.id)),
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

    /// Update an election.
    pub async fn update(
        &self,
        id: &str,
        input: ElectionInput,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<election::Model> {
        input.validate()?;

        let existing = self.election_repo.get_by_id(id).await?;
        let before = snapshot(&existing)?;

        let mut model: election::ActiveModel = existing.into();
        model.title = Set(input.title);
        model.description = Set(input.description);
        model.is_active = Set(input.is_active);
        model.starts_at = Set(input.starts_at);
        model.ends_at = Set(input.ends_at);
        model.updated_at = Set(Some(self.clock.now()));

        let saved = self.election_repo.update(model).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "election.updated",
                    title: "Election updated".to_string(),
                    description: format!("Updated election \"{}\"", saved.title),
                    subject: Some(SubjectRef::Election(&saved.id)),
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

    /// Delete an election along with its positions, candidates, votes
    /// and attendance rows.
    pub async fn delete(
        &self,
        id: &str,
        actor: &user::Model,
        meta: &RequestMeta,
    ) -> AppResult<()> {
        let existing = self.election_repo.get_by_id(id).await?;
        let before = snapshot(&existing)?;
        self.election_repo.delete(id).await?;

        self.audit
            .record(
                AuditEntry {
                    action: "election.deleted",
                    title: "Election deleted".to_string(),
                    description: format!("Deleted election \"{}\"", existing.title),
                    subject: Some(SubjectRef::Election(id)),
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
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
    }

    fn election_with(
        is_active: bool,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> election::Model {
        election::Model {
            id: "e1".to_string(),
            title: "Election".to_string(),
            description: None,
            is_active,
            starts_at,
            ends_at,
            created_by: None,
            created_at: instant(),
            updated_at: None,
        }
    }

    #[test]
    fn test_status_upcoming_wins_over_flag() {
        let now = instant();
        let election = election_with(true, Some(now + Duration::days(1)), None);
        assert_eq!(ElectionStatus::of(&election, now), ElectionStatus::Upcoming);
    }

    #[test]
    fn test_status_ended_wins_over_flag() {
        let now = instant();
        let election = election_with(
            true,
            Some(now - Duration::days(2)),
            Some(now - Duration::days(1)),
        );
        assert_eq!(ElectionStatus::of(&election, now), ElectionStatus::Ended);
    }

    #[test]
    fn test_status_follows_flag_inside_window() {
        let now = instant();
        let window = (
            Some(now - Duration::days(1)),
            Some(now + Duration::days(1)),
        );

        let open = election_with(true, window.0, window.1);
        assert_eq!(ElectionStatus::of(&open, now), ElectionStatus::Active);

        let closed = election_with(false, window.0, window.1);
        assert_eq!(ElectionStatus::of(&closed, now), ElectionStatus::Inactive);
    }

    #[test]
    fn test_status_open_ended_inactive_falls_out_as_ended() {
        // With no end bound the in-window arm never fires, the flag
        // replay fails for an inactive election, and the chain lands on
        // its `ended` default.
        let now = instant();
        let started = election_with(false, Some(now - Duration::days(1)), None);
        assert_eq!(ElectionStatus::of(&started, now), ElectionStatus::Ended);

        let unscheduled = election_with(false, None, None);
        assert_eq!(ElectionStatus::of(&unscheduled, now), ElectionStatus::Ended);
    }

    #[test]
    fn test_status_open_ended_active_reads_as_active() {
        let now = instant();
        let election = election_with(true, Some(now - Duration::days(1)), None);
        assert_eq!(ElectionStatus::of(&election, now), ElectionStatus::Active);
    }

    #[test]
    fn test_status_active_without_dates_still_refuses_votes() {
        // The label and the acceptance gate deliberately diverge here.
        let now = instant();
        let election = election_with(true, None, None);
        assert_eq!(ElectionStatus::of(&election, now), ElectionStatus::Active);
        assert!(!crate::services::voting::election_accepts_votes(
            &election, now
        ));
    }

    #[test]
    fn test_input_rejects_empty_title() {
        let input = ElectionInput {
            title: String::new(),
            description: None,
            is_active: false,
            starts_at: None,
            ends_at: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_input_rejects_end_not_after_start() {
        let now = instant();
        let mut input = ElectionInput {
            title: "Student Council".to_string(),
            description: None,
            is_active: true,
            starts_at: Some(now),
            ends_at: Some(now - Duration::days(1)),
        };
        assert!(input.validate().is_err());

        // Equal bounds are rejected too; the end must be strictly after
        input.ends_at = Some(now);
        assert!(input.validate().is_err());

        input.ends_at = Some(now + Duration::days(1));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_input_accepts_open_ended_schedule() {
        let input = ElectionInput {
            title: "Student Council".to_string(),
            description: None,
            is_active: true,
            starts_at: Some(instant()),
            ends_at: None,
        };
        assert!(input.validate().is_ok());
    }
}
