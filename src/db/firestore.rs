// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts keyed by URL-encoded email)
//! - Reports (damage reports keyed by report ID)

use super::{collections, sort_newest_first, stamp_commit, ReportStore, UserDirectory};
use crate::error::AppError;
use crate::models::{Report, ReportState, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }
}

/// Whether a transactional read or commit lost to a concurrent writer.
///
/// Firestore reports contention as gRPC `ABORTED`, which the client
/// surfaces as a retryable `DatabaseError`.
fn is_contention(err: &FirestoreError) -> bool {
    match err {
        FirestoreError::DataConflictError(_) => true,
        FirestoreError::DatabaseError(db_err) => db_err.public.code == "Aborted",
        _ => false,
    }
}

fn conflict(id: &str) -> AppError {
    AppError::Conflict(format!("Report {} changed concurrently", id))
}

/// Emails contain characters Firestore document IDs should not carry raw.
fn user_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

// ─── Report Operations ───────────────────────────────────────

#[async_trait]
impl ReportStore for FirestoreDb {
    async fn get_report(&self, id: &str) -> Result<Option<Report>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::REPORTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_report(&self, report: &Report) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::REPORTS)
            .document_id(&report.id)
            .object(report)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::AlreadyExists(format!("Report {}", report.id))
                }
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    /// Conditional replace inside a transaction.
    ///
    /// The document is read through the transaction so a concurrent commit
    /// on the same report aborts ours.
    async fn replace_report(
        &self,
        report: &Report,
        expected: ReportState,
    ) -> Result<Report, AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_db = self.client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let read: Result<Option<Report>, FirestoreError> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::REPORTS)
            .obj()
            .one(&report.id)
            .await;

        let current = match read {
            Ok(Some(current)) => current,
            Ok(None) => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Report {} not found", report.id)));
            }
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(if is_contention(&e) {
                    conflict(&report.id)
                } else {
                    AppError::Database(format!("Failed to read report in transaction: {}", e))
                });
            }
        };

        if current.state() != expected {
            tracing::debug!(
                report_id = %report.id,
                expected_progress = %expected.progress,
                stored_progress = %current.progress,
                "Stale report state, rejecting write"
            );
            let _ = transaction.rollback().await;
            return Err(conflict(&report.id));
        }

        // Stamped as late as possible; the commit round trip and clock skew
        // between instances are absorbed by the notification grace period.
        let next = stamp_commit(report, &current, chrono::Utc::now());

        self.client
            .fluent()
            .update()
            .in_col(collections::REPORTS)
            .document_id(&report.id)
            .object(&next)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add report to transaction: {}", e))
            })?;

        transaction.commit().await.map_err(|e| {
            if is_contention(&e) {
                conflict(&report.id)
            } else {
                AppError::Database(format!("Transaction commit failed: {}", e))
            }
        })?;

        Ok(next)
    }

    async fn list_reports_by_submitter(&self, email: &str) -> Result<Vec<Report>, AppError> {
        let email = email.to_string();
        let mut reports: Vec<Report> = self
            .client
            .fluent()
            .select()
            .from(collections::REPORTS)
            .filter(move |q| q.for_all([q.field("submitter_email").eq(email.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Timestamps are stored as strings; order in memory rather than by field.
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, AppError> {
        let mut reports: Vec<Report> = self
            .client
            .fluent()
            .select()
            .from(collections::REPORTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sort_newest_first(&mut reports);
        Ok(reports)
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserDirectory for FirestoreDb {
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(user_doc_id(&user.email))
            .object(user)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::AlreadyExists(format!("User {}", user.email))
                }
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_doc_id(&user.email))
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
