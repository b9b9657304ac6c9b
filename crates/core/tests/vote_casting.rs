//! Vote casting integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test vote_casting -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ballot_common::{AppError, FixedClock};
use ballot_core::{VoteSelection, VotingService};
use ballot_db::entities::{candidate, election, position, user, vote, voter};
use ballot_db::repositories::{
    AttendanceRepository, CandidateRepository, ElectionRepository, PositionRepository,
    VoteRepository, VoterRepository,
};
use ballot_db::test_utils::TestDatabase;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};

fn instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().unwrap()
}

fn service(db: &Arc<DatabaseConnection>) -> VotingService {
    VotingService::new(
        Arc::clone(db),
        CandidateRepository::new(Arc::clone(db)),
        PositionRepository::new(Arc::clone(db)),
        ElectionRepository::new(Arc::clone(db)),
        VoteRepository::new(Arc::clone(db)),
        Arc::new(FixedClock(instant())),
    )
}

struct Fixture {
    student: user::Model,
    election: election::Model,
    president: position::Model,
    secretary: position::Model,
    president_candidate: candidate::Model,
    secretary_candidate: candidate::Model,
}

async fn seed(conn: &DatabaseConnection, open: bool) -> Fixture {
    let now = instant();

    let student = user::ActiveModel {
        id: Set("u1".to_string()),
        username: Set("casey".to_string()),
        username_lower: Set("casey".to_string()),
        token: Set(None),
        name: Set(Some("Casey".to_string())),
        email: Set(None),
        role: Set(user::Role::Student),
        status: Set(user::Status::Approved),
        course: Set(Some("BSIT".to_string())),
        section: Set(Some("3A".to_string())),
        year_level: Set(Some("3".to_string())),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    let (starts_at, ends_at) = if open {
        (Some(now - Duration::days(1)), Some(now + Duration::days(1)))
    } else {
        (Some(now - Duration::days(2)), Some(now - Duration::days(1)))
    };

    let election = election::ActiveModel {
        id: Set("e1".to_string()),
        title: Set("Student Council".to_string()),
        description: Set(None),
        is_active: Set(true),
        starts_at: Set(starts_at),
        ends_at: Set(ends_at),
        created_by: Set(None),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    let mut positions = Vec::new();
    for (id, name) in [("p1", "President"), ("p2", "Secretary")] {
        positions.push(
            position::ActiveModel {
                id: Set(id.to_string()),
                election_id: Set(election.id.clone()),
                name: Set(name.to_string()),
                description: Set(None),
                max_votes: Set(1),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(conn)
            .await
            .unwrap(),
        );
    }

    let mut candidates = Vec::new();
    for (id, position_id, name) in [("c1", "p1", "Jamie"), ("c2", "p2", "Riley")] {
        candidates.push(
            candidate::ActiveModel {
                id: Set(id.to_string()),
                position_id: Set(position_id.to_string()),
                name: Set(name.to_string()),
                photo_url: Set(None),
                bio: Set(None),
                status: Set(candidate::CandidateStatus::Active),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(conn)
            .await
            .unwrap(),
        );
    }

    let secretary_candidate = candidates.pop().unwrap();
    let president_candidate = candidates.pop().unwrap();
    let secretary = positions.pop().unwrap();
    let president = positions.pop().unwrap();

    Fixture {
        student,
        election,
        president,
        secretary,
        president_candidate,
        secretary_candidate,
    }
}

async fn vote_count(conn: &Arc<DatabaseConnection>, election_id: &str, voter_id: &str) -> u64 {
    VoteRepository::new(Arc::clone(conn))
        .count_by_voter_and_election(voter_id, election_id)
        .await
        .unwrap()
}

async fn times_voted(conn: &Arc<DatabaseConnection>, user_id: &str) -> Option<i32> {
    VoterRepository::new(Arc::clone(conn))
        .find_by_user(user_id)
        .await
        .unwrap()
        .map(|v| v.times_voted)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_single_cast_records_vote_counter_and_attendance() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), true).await;
    let voting = service(&db.conn);

    let outcome = voting
        .cast(
            &fixture.student,
            &fixture.election.id,
            VoteSelection {
                position_id: fixture.president.id.clone(),
                candidate_id: fixture.president_candidate.id.clone(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.votes_recorded, 1);
    assert_eq!(outcome.election_id, fixture.election.id);
    assert_eq!(
        vote_count(&db.conn, &fixture.election.id, &fixture.student.id).await,
        1
    );
    assert_eq!(times_voted(&db.conn, &fixture.student.id).await, Some(1));

    let attendance = AttendanceRepository::new(Arc::clone(&db.conn))
        .find_by_user_and_election(&fixture.student.id, &fixture.election.id)
        .await
        .unwrap()
        .expect("attendance row");
    assert_eq!(attendance.voted_at, instant());
    assert_eq!(attendance.course.as_deref(), Some("BSIT"));
    assert_eq!(attendance.section.as_deref(), Some("3A"));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_repeat_cast_for_same_position_is_rejected() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), true).await;
    let voting = service(&db.conn);

    let selection = VoteSelection {
        position_id: fixture.president.id.clone(),
        candidate_id: fixture.president_candidate.id.clone(),
    };

    voting
        .cast(&fixture.student, &fixture.election.id, selection.clone())
        .await
        .unwrap();

    let err = voting
        .cast(&fixture.student, &fixture.election.id, selection)
        .await
        .unwrap_err();

    match err {
        AppError::Validation { field, message } => {
            assert_eq!(field, "candidate_id");
            assert_eq!(message, "You have already cast a vote for this position.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Nothing changed on the second attempt
    assert_eq!(
        vote_count(&db.conn, &fixture.election.id, &fixture.student.id).await,
        1
    );
    assert_eq!(times_voted(&db.conn, &fixture.student.id).await, Some(1));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_losing_a_duplicate_race_reads_as_already_voted() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), true).await;
    let voting = service(&db.conn);

    // A competing session holds an uncommitted vote for the same seat.
    // The pre-check cannot see it, so the cast proceeds to its insert
    // and blocks on the unique index until the competitor commits.
    let competing = db.connection().begin().await.unwrap();
    VoteRepository::insert_on(
        &competing,
        vote::ActiveModel {
            id: Set("v0".to_string()),
            election_id: Set(fixture.election.id.clone()),
            position_id: Set(fixture.president.id.clone()),
            candidate_id: Set(fixture.president_candidate.id.clone()),
            voter_id: Set(fixture.student.id.clone()),
            created_at: Set(instant()),
        },
    )
    .await
    .unwrap();

    let cast = voting.cast(
        &fixture.student,
        &fixture.election.id,
        VoteSelection {
            position_id: fixture.president.id.clone(),
            candidate_id: fixture.president_candidate.id.clone(),
        },
    );
    let release = async {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        competing.commit().await.unwrap();
    };
    let (result, ()) = tokio::join!(cast, release);

    match result.unwrap_err() {
        AppError::Validation { field, message } => {
            assert_eq!(field, "candidate_id");
            assert_eq!(message, "You have already cast a vote for this position.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Only the competitor's row survives; the losing transaction rolled
    // back its counter bump and attendance write.
    assert_eq!(
        vote_count(&db.conn, &fixture.election.id, &fixture.student.id).await,
        1
    );
    assert_eq!(times_voted(&db.conn, &fixture.student.id).await, None);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_bulk_cast_commits_all_positions_at_once() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), true).await;
    let voting = service(&db.conn);

    let outcome = voting
        .cast_bulk(
            &fixture.student,
            &fixture.election.id,
            &[
                VoteSelection {
                    position_id: fixture.president.id.clone(),
                    candidate_id: fixture.president_candidate.id.clone(),
                },
                VoteSelection {
                    position_id: fixture.secretary.id.clone(),
                    candidate_id: fixture.secretary_candidate.id.clone(),
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(outcome.votes_recorded, 2);
    assert_eq!(
        vote_count(&db.conn, &fixture.election.id, &fixture.student.id).await,
        2
    );
    assert_eq!(times_voted(&db.conn, &fixture.student.id).await, Some(2));

    // One attendance row regardless of how many seats were voted
    let turnout = AttendanceRepository::new(Arc::clone(&db.conn))
        .count_by_election(&fixture.election.id)
        .await
        .unwrap();
    assert_eq!(turnout, 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_bulk_cast_with_duplicate_position_writes_nothing() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), true).await;
    let voting = service(&db.conn);

    let err = voting
        .cast_bulk(
            &fixture.student,
            &fixture.election.id,
            &[
                VoteSelection {
                    position_id: fixture.president.id.clone(),
                    candidate_id: fixture.president_candidate.id.clone(),
                },
                VoteSelection {
                    position_id: fixture.president.id.clone(),
                    candidate_id: fixture.president_candidate.id.clone(),
                },
            ],
        )
        .await
        .unwrap_err();

    match err {
        AppError::Validation { field, message } => {
            assert_eq!(field, "votes");
            assert_eq!(message, "You can only vote once per position.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(
        vote_count(&db.conn, &fixture.election.id, &fixture.student.id).await,
        0
    );
    assert_eq!(times_voted(&db.conn, &fixture.student.id).await, None);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_cast_into_ended_election_is_rejected() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), false).await;
    let voting = service(&db.conn);

    let err = voting
        .cast(
            &fixture.student,
            &fixture.election.id,
            VoteSelection {
                position_id: fixture.president.id.clone(),
                candidate_id: fixture.president_candidate.id.clone(),
            },
        )
        .await
        .unwrap_err();

    match err {
        AppError::Validation { field, message } => {
            assert_eq!(field, "election_id");
            assert_eq!(message, "This election is not currently accepting votes.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(
        vote_count(&db.conn, &fixture.election.id, &fixture.student.id).await,
        0
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_counter_survives_prior_profile() {
    let db = TestDatabase::create_unique().await.unwrap();
    let fixture = seed(db.connection(), true).await;
    let voting = service(&db.conn);

    // Admin pre-registered the profile before any votes
    voter::ActiveModel {
        id: Set("vp1".to_string()),
        user_id: Set(fixture.student.id.clone()),
        is_allowed: Set(true),
        times_voted: Set(0),
        created_at: Set(instant()),
        updated_at: Set(None),
    }
    .insert(db.connection())
    .await
    .unwrap();

    voting
        .cast(
            &fixture.student,
            &fixture.election.id,
            VoteSelection {
                position_id: fixture.president.id.clone(),
                candidate_id: fixture.president_candidate.id.clone(),
            },
        )
        .await
        .unwrap();

    assert_eq!(times_voted(&db.conn, &fixture.student.id).await, Some(1));
    assert_eq!(
        VoteRepository::new(Arc::clone(&db.conn))
            .count_by_candidate(&fixture.president_candidate.id)
            .await
            .unwrap(),
        1
    );

    db.drop_database().await.unwrap();
}
