//! Voter profile repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::entities::{Voter, voter};
use ballot_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Voter profile repository for database operations.
#[derive(Clone)]
pub struct VoterRepository {
    db: Arc<DatabaseConnection>,
}

impl VoterRepository {
    /// Create a new voter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the profile for a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Option<voter::Model>> {
        Voter::find()
            .filter(voter::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a profile.
    pub async fn create(&self, model: voter::ActiveModel) -> AppResult<voter::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a profile.
    pub async fn update(&self, model: voter::ActiveModel) -> AppResult<voter::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the profile for a user on the given connection.
    pub async fn find_by_user_on<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
    ) -> Result<Option<voter::Model>, sea_orm::DbErr> {
        Voter::find()
            .filter(voter::Column::UserId.eq(user_id))
            .one(conn)
            .await
    }

    /// Insert a profile on the given connection.
    pub async fn insert_on<C: ConnectionTrait>(
        conn: &C,
        model: voter::ActiveModel,
    ) -> Result<voter::Model, sea_orm::DbErr> {
        model.insert(conn).await
    }

    /// Atomically add `count` to `times_voted` for a user's profile.
    pub async fn increment_times_voted_on<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        count: i32,
        now: DateTime<Utc>,
    ) -> Result<(), sea_orm::DbErr> {
        Voter::update_many()
            .col_expr(
                voter::Column::TimesVoted,
                Expr::col(voter::Column::TimesVoted).add(count),
            )
            .col_expr(voter::Column::UpdatedAt, Expr::value(now))
            .filter(voter::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(())
    }
}
