//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `ballot_test`)
//!   `TEST_DB_PASSWORD` (default: `ballot_test`)
//!   `TEST_DB_NAME` (default: `ballot_test`)

#![allow(clippy::unwrap_used)]

use ballot_db::test_utils::{TestDatabase, TestDbConfig};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply_cleanly() {
    let db = TestDatabase::create_unique().await.unwrap();

    // All eight tables should exist after migration
    use sea_orm::{ConnectionTrait, Statement};
    let rows = db
        .connection()
        .query_all(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
        ))
        .await
        .unwrap();

    let tables: Vec<String> = rows
        .iter()
        .filter_map(|r| r.try_get::<String>("", "tablename").ok())
        .collect();

    for expected in [
        "user",
        "election",
        "position",
        "candidate",
        "vote",
        "voter",
        "attendance",
        "audit_log",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing {expected}");
    }

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unique_vote_index_rejects_duplicates() {
    use ballot_db::entities::{election, position, candidate, user, vote};
    use ballot_db::repositories::VoteRepository;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};

    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection();
    let now = Utc::now();

    user::ActiveModel {
        id: Set("u1".to_string()),
        username: Set("casey".to_string()),
        username_lower: Set("casey".to_string()),
        token: Set(None),
        name: Set(Some("Casey".to_string())),
        email: Set(None),
        role: Set(user::Role::Student),
        status: Set(user::Status::Approved),
        course: Set(None),
        section: Set(None),
        year_level: Set(None),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    election::ActiveModel {
        id: Set("e1".to_string()),
        title: Set("Test Election".to_string()),
        description: Set(None),
        is_active: Set(true),
        starts_at: Set(Some(now)),
        ends_at: Set(None),
        created_by: Set(None),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    position::ActiveModel {
        id: Set("p1".to_string()),
        election_id: Set("e1".to_string()),
        name: Set("President".to_string()),
        description: Set(None),
        max_votes: Set(1),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    candidate::ActiveModel {
        id: Set("c1".to_string()),
        position_id: Set("p1".to_string()),
        name: Set("Jamie".to_string()),
        photo_url: Set(None),
        bio: Set(None),
        status: Set(candidate::CandidateStatus::Active),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    let first = VoteRepository::insert_on(
        conn,
        vote::ActiveModel {
            id: Set("v1".to_string()),
            election_id: Set("e1".to_string()),
            position_id: Set("p1".to_string()),
            candidate_id: Set("c1".to_string()),
            voter_id: Set("u1".to_string()),
            created_at: Set(now),
        },
    )
    .await;
    assert!(first.is_ok());

    // Same (election, position, voter), different candidate: index must reject
    let second = VoteRepository::insert_on(
        conn,
        vote::ActiveModel {
            id: Set("v2".to_string()),
            election_id: Set("e1".to_string()),
            position_id: Set("p1".to_string()),
            candidate_id: Set("c1".to_string()),
            voter_id: Set("u1".to_string()),
            created_at: Set(now),
        },
    )
    .await;

    let err = second.unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
