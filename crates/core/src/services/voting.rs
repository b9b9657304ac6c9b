//! Vote casting.
//!
//! The only subsystem with real invariants: a voter casts at most one
//! ballot per contested seat per election, and every accepted submission
//! commits its vote rows, the voter's counter bump and the attendance
//! upsert as one storage transaction.

use std::collections::HashSet;
use std::sync::Arc;

use ballot_common::{AppError, AppResult, Clock, IdGenerator};
use ballot_db::{
    entities::{attendance, candidate, election, position, user, vote, voter},
    repositories::{
        AttendanceRepository, CandidateRepository, ElectionRepository, PositionRepository,
        VoteRepository, VoterRepository,
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, Set, SqlErr, TransactionTrait};
use thiserror::Error;

/// Why a submission was rejected. Every variant is a user-recoverable
/// validation failure scoped to one request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("The selected candidate is not available for voting.")]
    CandidateNotFound,

    #[error("The selected candidate does not belong to this position.")]
    PositionMismatch,

    #[error("The selected candidate does not belong to this election.")]
    ElectionMismatch,

    #[error("This election is not currently accepting votes.")]
    ElectionClosed,

    #[error("You have already cast a vote for this position.")]
    AlreadyVoted,

    #[error("You can only vote once per position.")]
    DuplicatePosition,

    #[error("Please select at least one candidate.")]
    EmptySubmission,
}

impl VoteError {
    /// The request field the rejection is scoped to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::CandidateNotFound | Self::AlreadyVoted => "candidate_id",
            Self::PositionMismatch => "position_id",
            Self::ElectionMismatch | Self::ElectionClosed => "election_id",
            Self::DuplicatePosition | Self::EmptySubmission => "votes",
        }
    }
}

impl From<VoteError> for AppError {
    fn from(err: VoteError) -> Self {
        Self::validation(err.field(), err.to_string())
    }
}

/// Whether an election accepts votes at `now`.
///
/// This boolean gate is the only acceptance authority. The looser
/// display status shown on admin listings is a separate derivation and
/// must never be consulted here.
#[must_use]
pub fn election_accepts_votes(election: &election::Model, now: DateTime<Utc>) -> bool {
    if !election.is_active {
        return false;
    }

    // No start date means the window is not yet determined.
    let Some(starts_at) = election.starts_at else {
        return false;
    };
    if starts_at > now {
        return false;
    }

    // No end date means open-ended.
    election.ends_at.is_none_or(|ends_at| ends_at >= now)
}

/// One selection within a submission.
#[derive(Debug, Clone)]
pub struct VoteSelection {
    pub position_id: String,
    pub candidate_id: String,
}

/// A fully validated (candidate, position, election) triple, ready to be
/// persisted. Produced only by the resolver; no writes happen before one
/// of these exists.
#[derive(Debug, Clone)]
pub struct VoteContext {
    pub candidate: candidate::Model,
    pub position: position::Model,
    pub election: election::Model,
}

/// Result of a committed submission.
#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub election_id: String,
    pub votes_recorded: usize,
}

/// Vote casting service.
#[derive(Clone)]
pub struct VotingService {
    db: Arc<DatabaseConnection>,
    candidate_repo: CandidateRepository,
    position_repo: PositionRepository,
    election_repo: ElectionRepository,
    vote_repo: VoteRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        candidate_repo: CandidateRepository,
        position_repo: PositionRepository,
        election_repo: ElectionRepository,
        vote_repo: VoteRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            candidate_repo,
            position_repo,
            election_repo,
            vote_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a single vote.
    pub async fn cast(
        &self,
        voter_user: &user::Model,
        election_id: &str,
        selection: VoteSelection,
    ) -> AppResult<CastOutcome> {
        let now = self.clock.now();

        let context = self
            .resolve_context(
                &voter_user.id,
                election_id,
                &selection.position_id,
                &selection.candidate_id,
                now,
            )
            .await?;

        self.commit_votes(voter_user, vec![context], now).await
    }

    /// Cast several votes in one submission. All selections must target
    /// the same election and pairwise-distinct positions; the whole batch
    /// is rejected if any entry fails.
    pub async fn cast_bulk(
        &self,
        voter_user: &user::Model,
        election_id: &str,
        selections: &[VoteSelection],
    ) -> AppResult<CastOutcome> {
        if selections.is_empty() {
            return Err(VoteError::EmptySubmission.into());
        }
        ensure_unique_positions(selections)?;

        let now = self.clock.now();

        let mut contexts = Vec::with_capacity(selections.len());
        for selection in selections {
            contexts.push(
                self.resolve_context(
                    &voter_user.id,
                    election_id,
                    &selection.position_id,
                    &selection.candidate_id,
                    now,
                )
                .await?,
            );
        }

        self.commit_votes(voter_user, contexts, now).await
    }

    /// Validate one (candidate, position, election, voter) tuple.
    ///
    /// Five checks, in order, each short-circuiting; all pure reads.
    async fn resolve_context(
        &self,
        voter_id: &str,
        election_id: &str,
        position_id: &str,
        candidate_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<VoteContext> {
        let candidate = self
            .candidate_repo
            .find_by_id(candidate_id)
            .await?
            .ok_or(VoteError::CandidateNotFound)?;

        let position = self
            .position_repo
            .find_by_id(&candidate.position_id)
            .await?
            .ok_or(VoteError::CandidateNotFound)?;

        let election = self
            .election_repo
            .find_by_id(&position.election_id)
            .await?
            .ok_or(VoteError::CandidateNotFound)?;

        if position.id != position_id {
            return Err(VoteError::PositionMismatch.into());
        }

        if election.id != election_id {
            return Err(VoteError::ElectionMismatch.into());
        }

        if !election_accepts_votes(&election, now) {
            return Err(VoteError::ElectionClosed.into());
        }

        // Friendly pre-check. Two concurrent submissions can both pass it;
        // the unique index catches the loser inside commit_votes.
        if self
            .vote_repo
            .exists_for(&election.id, &position.id, voter_id)
            .await?
        {
            return Err(VoteError::AlreadyVoted.into());
        }

        Ok(VoteContext {
            candidate,
            position,
            election,
        })
    }

    /// Persist a batch of resolved contexts as one transaction: the vote
    /// rows, the `times_voted` increment and the attendance upsert all
    /// commit together or not at all. Dropping the transaction without
    /// committing rolls everything back.
    async fn commit_votes(
        &self,
        voter_user: &user::Model,
        contexts: Vec<VoteContext>,
        now: DateTime<Utc>,
    ) -> AppResult<CastOutcome> {
        let election = contexts
            .first()
            .map(|c| c.election.clone())
            .ok_or(VoteError::EmptySubmission)?;
        let count = contexts.len();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for context in &contexts {
            let model = vote::ActiveModel {
                id: Set(self.id_gen.generate()),
                election_id: Set(context.election.id.clone()),
                position_id: Set(context.position.id.clone()),
                candidate_id: Set(context.candidate.id.clone()),
                voter_id: Set(voter_user.id.clone()),
                created_at: Set(now),
            };

            VoteRepository::insert_on(&txn, model)
                .await
                .map_err(map_vote_insert_err)?;
        }

        self.bump_voter_counter(&txn, voter_user, count, now)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.record_attendance(&txn, voter_user, &election, now)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            voter_id = %voter_user.id,
            election_id = %election.id,
            votes = count,
            "Recorded votes"
        );

        Ok(CastOutcome {
            election_id: election.id,
            votes_recorded: count,
        })
    }

    /// Ensure a voter profile exists, then add `count` to its counter.
    async fn bump_voter_counter<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        voter_user: &user::Model,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        if VoterRepository::find_by_user_on(conn, &voter_user.id)
            .await?
            .is_none()
        {
            let profile = voter::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(voter_user.id.clone()),
                is_allowed: Set(true),
                times_voted: Set(0),
                created_at: Set(now),
                updated_at: Set(None),
            };
            VoterRepository::insert_on(conn, profile).await?;
        }

        let count = i32::try_from(count).unwrap_or(i32::MAX);
        VoterRepository::increment_times_voted_on(conn, &voter_user.id, count, now).await
    }

    /// Upsert the attendance row for (user, election), refreshing the
    /// timestamp and the course/section snapshot.
    async fn record_attendance<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        voter_user: &user::Model,
        election: &election::Model,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let existing =
            AttendanceRepository::find_by_user_and_election_on(conn, &voter_user.id, &election.id)
                .await?;

        if let Some(row) = existing {
            let mut active: attendance::ActiveModel = row.into();
            active.voted_at = Set(now);
            active.course = Set(voter_user.course.clone());
            active.section = Set(voter_user.section.clone());
            active.updated_at = Set(Some(now));
            AttendanceRepository::update_on(conn, active).await?;
        } else {
            let model = attendance::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(voter_user.id.clone()),
                election_id: Set(election.id.clone()),
                voted_at: Set(now),
                course: Set(voter_user.course.clone()),
                section: Set(voter_user.section.clone()),
                created_at: Set(now),
                updated_at: Set(None),
            };
            AttendanceRepository::insert_on(conn, model).await?;
        }

        Ok(())
    }
}

/// Reject a batch referencing the same position twice.
fn ensure_unique_positions(selections: &[VoteSelection]) -> Result<(), VoteError> {
    let mut seen = HashSet::with_capacity(selections.len());
    for selection in selections {
        if !seen.insert(selection.position_id.as_str()) {
            return Err(VoteError::DuplicatePosition);
        }
    }
    Ok(())
}

/// Map a failed vote insert. A uniqueness violation means a concurrent
/// submission won the race after our pre-check; surface it as the same
/// user-facing rejection instead of a bare persistence error.
fn map_vote_insert_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => VoteError::AlreadyVoted.into(),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ballot_common::FixedClock;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
    }

    fn make_election(
        is_active: bool,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> election::Model {
        election::Model {
            id: "e1".to_string(),
            title: "Student Council Election".to_string(),
            description: None,
            is_active,
            starts_at,
            ends_at,
            created_by: None,
            created_at: instant() - Duration::days(7),
            updated_at: None,
        }
    }

    fn make_position(id: &str, election_id: &str) -> position::Model {
        position::Model {
            id: id.to_string(),
            election_id: election_id.to_string(),
            name: "President".to_string(),
            description: None,
            max_votes: 1,
            created_at: instant() - Duration::days(7),
            updated_at: None,
        }
    }

    fn make_candidate(id: &str, position_id: &str) -> candidate::Model {
        candidate::Model {
            id: id.to_string(),
            position_id: position_id.to_string(),
            name: "Jamie Rivers".to_string(),
            photo_url: None,
            bio: None,
            status: candidate::CandidateStatus::Active,
            created_at: instant() - Duration::days(7),
            updated_at: None,
        }
    }

    fn make_voter_user() -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "casey".to_string(),
            username_lower: "casey".to_string(),
            token: None,
            name: Some("Casey".to_string()),
            email: None,
            role: user::Role::Student,
            status: user::Status::Approved,
            course: Some("BSIT".to_string()),
            section: Some("3A".to_string()),
            year_level: None,
            created_at: instant() - Duration::days(30),
            updated_at: None,
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> VotingService {
        let db = Arc::new(db);
        VotingService::new(
            db.clone(),
            CandidateRepository::new(db.clone()),
            PositionRepository::new(db.clone()),
            ElectionRepository::new(db.clone()),
            VoteRepository::new(db),
            Arc::new(FixedClock(instant())),
        )
    }

    // === Window gate ===

    #[test]
    fn test_window_open_when_within_bounds() {
        let now = instant();
        let election = make_election(
            true,
            Some(now - Duration::days(1)),
            Some(now + Duration::days(1)),
        );
        assert!(election_accepts_votes(&election, now));
    }

    #[test]
    fn test_window_closed_when_flag_unset() {
        let now = instant();
        let election = make_election(
            false,
            Some(now - Duration::days(1)),
            Some(now + Duration::days(1)),
        );
        assert!(!election_accepts_votes(&election, now));
    }

    #[test]
    fn test_window_closed_before_start() {
        let now = instant();
        let election = make_election(true, Some(now + Duration::hours(1)), None);
        assert!(!election_accepts_votes(&election, now));
    }

    #[test]
    fn test_window_closed_after_end() {
        let now = instant();
        let election = make_election(
            true,
            Some(now - Duration::days(2)),
            Some(now - Duration::hours(1)),
        );
        assert!(!election_accepts_votes(&election, now));
    }

    #[test]
    fn test_window_open_ended_when_no_end_date() {
        let now = instant();
        let election = make_election(true, Some(now - Duration::days(365)), None);
        assert!(election_accepts_votes(&election, now));
    }

    #[test]
    fn test_window_closed_when_start_undetermined() {
        let now = instant();
        let election = make_election(true, None, Some(now + Duration::days(1)));
        assert!(!election_accepts_votes(&election, now));
    }

    #[test]
    fn test_window_boundaries_are_inclusive() {
        let now = instant();
        let election = make_election(true, Some(now), Some(now));
        assert!(election_accepts_votes(&election, now));
    }

    // === Structural checks ===

    #[test]
    fn test_duplicate_positions_rejected() {
        let selections = vec![
            VoteSelection {
                position_id: "p1".to_string(),
                candidate_id: "c1".to_string(),
            },
            VoteSelection {
                position_id: "p1".to_string(),
                candidate_id: "c2".to_string(),
            },
        ];
        assert_eq!(
            ensure_unique_positions(&selections),
            Err(VoteError::DuplicatePosition)
        );
    }

    #[test]
    fn test_distinct_positions_accepted() {
        let selections = vec![
            VoteSelection {
                position_id: "p1".to_string(),
                candidate_id: "c1".to_string(),
            },
            VoteSelection {
                position_id: "p2".to_string(),
                candidate_id: "c2".to_string(),
            },
        ];
        assert!(ensure_unique_positions(&selections).is_ok());
    }

    // === Error taxonomy ===

    #[test]
    fn test_error_field_scoping() {
        assert_eq!(VoteError::CandidateNotFound.field(), "candidate_id");
        assert_eq!(VoteError::AlreadyVoted.field(), "candidate_id");
        assert_eq!(VoteError::PositionMismatch.field(), "position_id");
        assert_eq!(VoteError::ElectionMismatch.field(), "election_id");
        assert_eq!(VoteError::ElectionClosed.field(), "election_id");
        assert_eq!(VoteError::DuplicatePosition.field(), "votes");
        assert_eq!(VoteError::EmptySubmission.field(), "votes");
    }

    #[test]
    fn test_error_converts_to_field_scoped_validation() {
        let err: AppError = VoteError::AlreadyVoted.into();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "candidate_id");
                assert_eq!(message, "You have already cast a vote for this position.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // === Resolver (MockDatabase) ===

    #[tokio::test]
    async fn test_resolve_rejects_unknown_candidate() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<candidate::Model>::new()])
            .into_connection();
        let service = service_with(db);

        let result = service
            .cast(
                &make_voter_user(),
                "e1",
                VoteSelection {
                    position_id: "p1".to_string(),
                    candidate_id: "missing".to_string(),
                },
            )
            .await;

        match result.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "candidate_id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_position_mismatch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[make_candidate("c1", "p1")]])
            .append_query_results([[make_position("p1", "e1")]])
            .append_query_results([[make_election(
                true,
                Some(instant() - Duration::days(1)),
                Some(instant() + Duration::days(1)),
            )]])
            .into_connection();
        let service = service_with(db);

        // Submission claims the candidate runs for p2
        let result = service
            .cast(
                &make_voter_user(),
                "e1",
                VoteSelection {
                    position_id: "p2".to_string(),
                    candidate_id: "c1".to_string(),
                },
            )
            .await;

        match result.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "position_id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_election_mismatch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[make_candidate("c1", "p1")]])
            .append_query_results([[make_position("p1", "e1")]])
            .append_query_results([[make_election(
                true,
                Some(instant() - Duration::days(1)),
                Some(instant() + Duration::days(1)),
            )]])
            .into_connection();
        let service = service_with(db);

        let result = service
            .cast(
                &make_voter_user(),
                "e2",
                VoteSelection {
                    position_id: "p1".to_string(),
                    candidate_id: "c1".to_string(),
                },
            )
            .await;

        match result.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "election_id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_closed_election() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[make_candidate("c1", "p1")]])
            .append_query_results([[make_position("p1", "e1")]])
            .append_query_results([[make_election(
                true,
                Some(instant() - Duration::days(10)),
                Some(instant() - Duration::days(1)),
            )]])
            .into_connection();
        let service = service_with(db);

        let result = service
            .cast(
                &make_voter_user(),
                "e1",
                VoteSelection {
                    position_id: "p1".to_string(),
                    candidate_id: "c1".to_string(),
                },
            )
            .await;

        match result.unwrap_err() {
            AppError::Validation { field, message } => {
                assert_eq!(field, "election_id");
                assert_eq!(message, "This election is not currently accepting votes.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_repeat_vote() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[make_candidate("c1", "p1")]])
            .append_query_results([[make_position("p1", "e1")]])
            .append_query_results([[make_election(
                true,
                Some(instant() - Duration::days(1)),
                Some(instant() + Duration::days(1)),
            )]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .into_connection();
        let service = service_with(db);

        let result = service
            .cast(
                &make_voter_user(),
                "e1",
                VoteSelection {
                    position_id: "p1".to_string(),
                    candidate_id: "c1".to_string(),
                },
            )
            .await;

        match result.unwrap_err() {
            AppError::Validation { field, message } => {
                assert_eq!(field, "candidate_id");
                assert_eq!(message, "You have already cast a vote for this position.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bulk_rejects_empty_submission() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);

        let result = service.cast_bulk(&make_voter_user(), "e1", &[]).await;

        match result.unwrap_err() {
            AppError::Validation { field, message } => {
                assert_eq!(field, "votes");
                assert_eq!(message, "Please select at least one candidate.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bulk_rejects_duplicate_positions_before_any_read() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);

        let selections = vec![
            VoteSelection {
                position_id: "p1".to_string(),
                candidate_id: "c1".to_string(),
            },
            VoteSelection {
                position_id: "p1".to_string(),
                candidate_id: "c2".to_string(),
            },
        ];

        // No query results were mocked, so reaching the resolver would panic;
        // the structural check must fire first.
        let result = service
            .cast_bulk(&make_voter_user(), "e1", &selections)
            .await;

        match result.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "votes"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
