//! Candidate repository.

use std::sync::Arc;

use crate::entities::{Candidate, candidate};
use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Candidate repository for database operations.
#[derive(Clone)]
pub struct CandidateRepository {
    db: Arc<DatabaseConnection>,
}

impl CandidateRepository {
    /// Create a new candidate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a candidate by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<candidate::Model>> {
        Candidate::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a candidate by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<candidate::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Candidate not found: {id}")))
    }

    /// List candidates for a position.
    pub async fn list_by_position(&self, position_id: &str) -> AppResult<Vec<candidate::Model>> {
        Candidate::find()
            .filter(candidate::Column::PositionId.eq(position_id))
            .order_by_asc(candidate::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active candidates for a position (the ballot view).
    pub async fn list_active_by_position(
        &self,
        position_id: &str,
    ) -> AppResult<Vec<candidate::Model>> {
        Candidate::find()
            .filter(candidate::Column::PositionId.eq(position_id))
            .filter(candidate::Column::Status.eq(candidate::CandidateStatus::Active))
            .order_by_asc(candidate::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new candidate.
    pub async fn create(&self, model: candidate::ActiveModel) -> AppResult<candidate::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a candidate.
    pub async fn update(&self, model: candidate::ActiveModel) -> AppResult<candidate::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a candidate.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Candidate::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
