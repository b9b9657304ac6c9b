//! Position repository.

use std::sync::Arc;

use crate::entities::{Position, position};
use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Position repository for database operations.
#[derive(Clone)]
pub struct PositionRepository {
    db: Arc<DatabaseConnection>,
}

impl PositionRepository {
    /// Create a new position repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a position by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<position::Model>> {
        Position::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a position by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<position::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Position not found: {id}")))
    }

    /// List positions for an election.
    pub async fn list_by_election(&self, election_id: &str) -> AppResult<Vec<position::Model>> {
        Position::find()
            .filter(position::Column::ElectionId.eq(election_id))
            .order_by_asc(position::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new position.
    pub async fn create(&self, model: position::ActiveModel) -> AppResult<position::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a position.
    pub async fn update(&self, model: position::ActiveModel) -> AppResult<position::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a position.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Position::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
