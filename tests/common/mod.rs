// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{DateTime, Utc};
use safestreet::config::Config;
use safestreet::db::{FirestoreDb, MemoryDb, ReportStore};
use safestreet::error::AppError;
use safestreet::middleware::auth::create_jwt;
use safestreet::models::{Progress, Report, Role, RoadLocation, SeenStatus, User};
use safestreet::routes::create_router;
use safestreet::services::{Classifier, ProfileUpdate, Registration};
use safestreet::workflow::{Actor, ClassificationResult};
use safestreet::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const AUTHORITY_CODE: &str = "AUTH123";
pub const PASSWORD: &str = "correct horse battery";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Canned classifier answers.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum StubClassifier {
    Answer(&'static str, f64),
    Down,
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(
        &self,
        _image_name: &str,
        _image: Vec<u8>,
    ) -> Result<ClassificationResult, AppError> {
        match self {
            StubClassifier::Answer(label, confidence) => Ok(ClassificationResult {
                label: label.to_string(),
                confidence: *confidence,
            }),
            StubClassifier::Down => Err(AppError::ClassificationUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}

/// Router plus handles on the state and in-memory store behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: MemoryDb,
}

/// Create a test app over in-memory storage and a classifier that
/// answers "Road" with confidence 0.92.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(StubClassifier::Answer("Road", 0.92))
}

#[allow(dead_code)]
pub fn create_test_app_with(classifier: StubClassifier) -> TestApp {
    let config = Config::test_default();
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(classifier),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
    }
}

/// Session token for `email` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(email: &str, role: Role) -> String {
    create_jwt(email, role, &Config::test_default().jwt_signing_key).unwrap()
}

/// Register a citizen account, optionally with a complete address.
#[allow(dead_code)]
pub async fn seed_user(app: &TestApp, email: &str, with_address: bool) -> User {
    let user = app
        .state
        .accounts
        .register(Registration {
            first_name: "Alice".to_string(),
            last_name: "Rao".to_string(),
            phone_number: "9000000000".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role: Role::User,
            authority_code: None,
        })
        .await
        .unwrap();

    if !with_address {
        return user;
    }

    let actor = Actor {
        email,
        role: Role::User,
    };
    app.state
        .accounts
        .update_profile(
            &actor,
            email,
            ProfileUpdate {
                address: Some("MG Road".to_string()),
                district: Some("Hyderabad".to_string()),
                pincode: Some("500001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

/// Register an authority account with the test enrollment code.
#[allow(dead_code)]
pub async fn seed_authority(app: &TestApp, email: &str) -> User {
    app.state
        .accounts
        .register(Registration {
            first_name: "Ravi".to_string(),
            last_name: "Kumar".to_string(),
            phone_number: "9111111111".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role: Role::Authority,
            authority_code: Some(AUTHORITY_CODE.to_string()),
        })
        .await
        .unwrap()
}

/// A stored report with fixed content.
#[allow(dead_code)]
pub fn test_report(
    id: &str,
    submitter: &str,
    progress: Progress,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
) -> Report {
    Report {
        id: id.to_string(),
        submitter_email: submitter.to_string(),
        image_name: format!("{id}.jpg"),
        image_url: format!("https://images.example.com/{id}.jpg"),
        predicted_image_url: None,
        classification: "Road".to_string(),
        confidence: 0.92,
        road_location: RoadLocation {
            address: "MG Road".to_string(),
            district: "Hyderabad".to_string(),
            pincode: "500001".to_string(),
        },
        status: SeenStatus::Unseen,
        progress,
        created_at,
        resolved_at,
    }
}

/// Insert a report straight into the store.
#[allow(dead_code)]
pub async fn seed_report(app: &TestApp, report: &Report) {
    app.db.insert_report(report).await.unwrap();
}

/// Send one request through the router and decode the JSON response.
/// Returns `Value::Null` for empty bodies.
#[allow(dead_code)]
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
