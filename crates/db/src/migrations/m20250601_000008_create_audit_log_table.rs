//! Create audit log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLog::Action).string_len(128).not_null())
                    .col(ColumnDef::new(AuditLog::Title).string_len(256).not_null())
                    .col(ColumnDef::new(AuditLog::Description).text())
                    .col(ColumnDef::new(AuditLog::UserId).string_len(32))
                    .col(ColumnDef::new(AuditLog::UserName).string_len(256))
                    .col(ColumnDef::new(AuditLog::SubjectType).string_len(32))
                    .col(ColumnDef::new(AuditLog::SubjectId).string_len(32))
                    .col(ColumnDef::new(AuditLog::Changes).json_binary())
                    .col(ColumnDef::new(AuditLog::IpAddress).string_len(64))
                    .col(ColumnDef::new(AuditLog::UserAgent).string_len(512))
                    .col(
                        ColumnDef::new(AuditLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_log_user")
                            .from(AuditLog::Table, AuditLog::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: action (viewer filters by action key)
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_action")
                    .table(AuditLog::Table)
                    .col(AuditLog::Action)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_created_at")
                    .table(AuditLog::Table)
                    .col(AuditLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuditLog {
    Table,
    Id,
    Action,
    Title,
    Description,
    UserId,
    UserName,
    SubjectType,
    SubjectId,
    Changes,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
