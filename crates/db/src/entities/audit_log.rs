//! Audit log entity.
//!
//! Append-only; rows are never mutated or deleted.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Action key, e.g. `election.created`
    #[sea_orm(indexed)]
    pub action: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Acting user; None for system-initiated events
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    /// Name snapshot, kept even if the user row is later removed
    #[sea_orm(nullable)]
    pub user_name: Option<String>,

    /// Kind of the affected entity (election/position/candidate/user)
    #[sea_orm(nullable)]
    pub subject_type: Option<String>,

    #[sea_orm(nullable)]
    pub subject_id: Option<String>,

    /// Structured before/after change payload
    #[sea_orm(column_type = "Json", nullable)]
    pub changes: Option<Json>,

    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    #[sea_orm(nullable)]
    pub user_agent: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
