//! Attendance repository.

use std::sync::Arc;

use crate::entities::{Attendance, attendance};
use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Attendance repository for database operations.
#[derive(Clone)]
pub struct AttendanceRepository {
    db: Arc<DatabaseConnection>,
}

impl AttendanceRepository {
    /// Create a new attendance repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the attendance row for (user, election).
    pub async fn find_by_user_and_election(
        &self,
        user_id: &str,
        election_id: &str,
    ) -> AppResult<Option<attendance::Model>> {
        Attendance::find()
            .filter(attendance::Column::UserId.eq(user_id))
            .filter(attendance::Column::ElectionId.eq(election_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count attendance rows for an election.
    pub async fn count_by_election(&self, election_id: &str) -> AppResult<u64> {
        Attendance::find()
            .filter(attendance::Column::ElectionId.eq(election_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the attendance row for (user, election) on the given connection.
    pub async fn find_by_user_and_election_on<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        election_id: &str,
    ) -> Result<Option<attendance::Model>, sea_orm::DbErr> {
        Attendance::find()
            .filter(attendance::Column::UserId.eq(user_id))
            .filter(attendance::Column::ElectionId.eq(election_id))
            .one(conn)
            .await
    }

    /// Insert an attendance row on the given connection.
    pub async fn insert_on<C: ConnectionTrait>(
        conn: &C,
        model: attendance::ActiveModel,
    ) -> Result<attendance::Model, sea_orm::DbErr> {
        model.insert(conn).await
    }

    /// Update an attendance row on the given connection.
    pub async fn update_on<C: ConnectionTrait>(
        conn: &C,
        model: attendance::ActiveModel,
    ) -> Result<attendance::Model, sea_orm::DbErr> {
        model.update(conn).await
    }
}
