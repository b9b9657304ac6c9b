//! Election repository.

use std::sync::Arc;

use crate::entities::{Election, election};
use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder,
};

/// Election repository for database operations.
#[derive(Clone)]
pub struct ElectionRepository {
    db: Arc<DatabaseConnection>,
}

impl ElectionRepository {
    /// Create a new election repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an election by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<election::Model>> {
        Election::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an election by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<election::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Election not found: {id}")))
    }

    /// List all elections, newest first.
    pub async fn list(&self) -> AppResult<Vec<election::Model>> {
        Election::find()
            .order_by_desc(election::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new election.
    pub async fn create(&self, model: election::ActiveModel) -> AppResult<election::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an election.
    pub async fn update(&self, model: election::ActiveModel) -> AppResult<election::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an election. Positions, candidates, votes and attendance
    /// rows go with it via foreign key cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Election::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
