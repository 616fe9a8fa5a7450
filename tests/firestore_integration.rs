// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Start one with `gcloud emulators firestore start` and export
//! FIRESTORE_EMULATOR_HOST; otherwise every test here is skipped.
//!
//! The emulator provides a clean state for each test run.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use safestreet::db::{FirestoreDb, ReportStore, UserDirectory};
use safestreet::error::AppError;
use safestreet::models::{Progress, Report, ReportState, Role, SeenStatus, User};
use safestreet::services::ReportService;
use safestreet::workflow::Actor;
use std::sync::Arc;
use tokio::sync::Barrier;

mod common;
use common::{test_db, test_report, StubClassifier};

/// Unique suffix for test isolation.
fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn test_user(email: &str) -> User {
    User {
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: Role::User,
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone_number: "9000000000".to_string(),
        address: "MG Road".to_string(),
        district: "Hyderabad".to_string(),
        pincode: "500001".to_string(),
        created_at: Utc::now().to_rfc3339(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_insert_and_duplicate() {
    require_emulator!();
    let db = test_db().await;
    let email = format!("{}+user@example.com", unique_id());

    let user = test_user(&email);
    db.insert_user(&user).await.expect("insert user");

    let fetched = db.get_user(&email).await.unwrap().expect("user exists");
    assert_eq!(fetched, user);

    let dup = db.insert_user(&user).await;
    assert!(matches!(dup, Err(AppError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_user_update() {
    require_emulator!();
    let db = test_db().await;
    let email = format!("{}+update@example.com", unique_id());

    let mut user = test_user(&email);
    db.insert_user(&user).await.unwrap();

    user.address = "Banjara Hills Road 12".to_string();
    db.update_user(&user).await.unwrap();

    let fetched = db.get_user(&email).await.unwrap().unwrap();
    assert_eq!(fetched.address, "Banjara Hills Road 12");
}

// ═══════════════════════════════════════════════════════════════════════════
// REPORT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_report_round_trip_and_listing() {
    require_emulator!();
    let db = test_db().await;
    let email = format!("{}+reports@example.com", unique_id());
    let now = Utc::now();

    let older = test_report(&unique_id(), &email, Progress::Unresolved, now - Duration::hours(1), None);
    let newer = test_report(&unique_id(), &email, Progress::Unresolved, now, None);
    db.insert_report(&older).await.unwrap();
    db.insert_report(&newer).await.unwrap();

    let fetched = db.get_report(&newer.id).await.unwrap().unwrap();
    assert_eq!(fetched.road_location, newer.road_location);
    assert_eq!(fetched.status, SeenStatus::Unseen);

    let mine = db.list_reports_by_submitter(&email).await.unwrap();
    let ids: Vec<&str> = mine.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
}

#[tokio::test]
async fn test_conditional_replace() {
    require_emulator!();
    let db = test_db().await;
    let email = format!("{}+cas@example.com", unique_id());

    let report = test_report(&unique_id(), &email, Progress::Reviewed, Utc::now(), None);
    db.insert_report(&report).await.unwrap();
    let expected = report.state();

    let mut resolved = report.clone();
    resolved.progress = Progress::Resolved;
    resolved.resolved_at = Some(Utc::now());

    let written = db.replace_report(&resolved, expected).await.unwrap();
    assert_eq!(written.progress, Progress::Resolved);

    let stale = db.replace_report(&resolved, expected).await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    let stored = db.get_report(&report.id).await.unwrap().unwrap();
    assert_eq!(stored.progress, Progress::Resolved);
    assert!(stored.resolved_at.is_some());
}

#[tokio::test]
async fn test_replace_missing_report() {
    require_emulator!();
    let db = test_db().await;
    let report = test_report(&unique_id(), "ghost@example.com", Progress::Reviewed, Utc::now(), None);

    let result = db.replace_report(&report, report.state()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

/// Releases readers in pairs so both updates start from the same snapshot.
struct LockstepFirestore {
    inner: FirestoreDb,
    barrier: Barrier,
}

#[async_trait]
impl ReportStore for LockstepFirestore {
    async fn get_report(&self, id: &str) -> Result<Option<Report>, AppError> {
        let report = self.inner.get_report(id).await?;
        self.barrier.wait().await;
        Ok(report)
    }

    async fn insert_report(&self, report: &Report) -> Result<(), AppError> {
        self.inner.insert_report(report).await
    }

    async fn replace_report(
        &self,
        report: &Report,
        expected: ReportState,
    ) -> Result<Report, AppError> {
        self.inner.replace_report(report, expected).await
    }

    async fn list_reports_by_submitter(&self, email: &str) -> Result<Vec<Report>, AppError> {
        self.inner.list_reports_by_submitter(email).await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, AppError> {
        self.inner.list_reports().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_resolve_single_winner() {
    require_emulator!();
    let db = test_db().await;
    let email = format!("{}+race@example.com", unique_id());
    let id = unique_id();
    db.insert_report(&test_report(&id, &email, Progress::Reviewed, Utc::now(), None))
        .await
        .unwrap();

    let store = Arc::new(LockstepFirestore {
        inner: db.clone(),
        barrier: Barrier::new(2),
    });
    let service = ReportService::new(store, Arc::new(db.clone()), Arc::new(StubClassifier::Down));

    let mut handles = Vec::new();
    for officer in ["one@ghmc.example.com", "two@ghmc.example.com"] {
        let service = service.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let actor = Actor {
                email: officer,
                role: Role::Authority,
            };
            service.set_progress(&actor, &id, Progress::Resolved).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(report) => {
                assert_eq!(report.progress, Progress::Resolved);
                successes += 1;
            }
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    let stored = db.get_report(&id).await.unwrap().unwrap();
    assert_eq!(stored.progress, Progress::Resolved);
    assert!(stored.resolved_at.is_some());
}
