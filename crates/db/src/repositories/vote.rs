//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Vote repository for database operations.
///
/// Reads go through the shared connection; the insert takes an explicit
/// connection so the voting service can place it inside its transaction.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a vote already exists for (election, position, voter).
    ///
    /// This is the friendly half of the uniqueness guard; the
    /// `unique_vote_per_position` index is the authoritative one.
    pub async fn exists_for(
        &self,
        election_id: &str,
        position_id: &str,
        voter_id: &str,
    ) -> AppResult<bool> {
        let count = Vote::find()
            .filter(vote::Column::ElectionId.eq(election_id))
            .filter(vote::Column::PositionId.eq(position_id))
            .filter(vote::Column::VoterId.eq(voter_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Count votes cast by a voter in an election.
    pub async fn count_by_voter_and_election(
        &self,
        voter_id: &str,
        election_id: &str,
    ) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::VoterId.eq(voter_id))
            .filter(vote::Column::ElectionId.eq(election_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count votes for a candidate.
    pub async fn count_by_candidate(&self, candidate_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::CandidateId.eq(candidate_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a vote row on the given connection (usually a transaction).
    ///
    /// The raw `DbErr` is returned so the caller can inspect
    /// `sql_err()` for a uniqueness violation.
    pub async fn insert_on<C: ConnectionTrait>(
        conn: &C,
        model: vote::ActiveModel,
    ) -> Result<vote::Model, sea_orm::DbErr> {
        model.insert(conn).await
    }
}
