//! Database layer (Firestore, with an in-memory fallback).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Progress, Report, ReportState, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const REPORTS: &str = "reports";
}

/// Storage for damage reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn get_report(&self, id: &str) -> Result<Option<Report>, AppError>;

    /// Store a newly created report.
    async fn insert_report(&self, report: &Report) -> Result<(), AppError>;

    /// Overwrite a report only if the stored `(progress, status)` still
    /// equals `expected`; otherwise fail with `AppError::Conflict`.
    ///
    /// Returns the report as written. A report entering `Resolved` has
    /// `resolved_at` re-stamped at commit, see [`stamp_commit`].
    async fn replace_report(
        &self,
        report: &Report,
        expected: ReportState,
    ) -> Result<Report, AppError>;

    /// Reports filed by `email`, newest first.
    async fn list_reports_by_submitter(&self, email: &str) -> Result<Vec<Report>, AppError>;

    /// Every report, newest first.
    async fn list_reports(&self) -> Result<Vec<Report>, AppError>;
}

/// Storage for user accounts, keyed by email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Create an account; `AppError::AlreadyExists` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    /// Overwrite an existing account.
    async fn update_user(&self, user: &User) -> Result<(), AppError>;
}

/// Sort reports newest first.
pub(crate) fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Stamp `resolved_at` with the commit time when `next` closes a report
/// that `stored` still has open.
///
/// Notification watermarks are compared against `resolved_at`, so it must
/// not predate the moment the resolution becomes visible to readers.
pub(crate) fn stamp_commit(next: &Report, stored: &Report, committed_at: DateTime<Utc>) -> Report {
    let mut next = next.clone();
    if next.progress == Progress::Resolved && stored.progress != Progress::Resolved {
        next.resolved_at = Some(committed_at);
    }
    next
}
