// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local store backed by `DashMap`.
//!
//! Used for tests and for `STORAGE_BACKEND=memory`. Conditional writes
//! hold the entry's shard lock across compare and swap.

use super::{sort_newest_first, stamp_commit, ReportStore, UserDirectory};
use crate::error::AppError;
use crate::models::{Report, ReportState, User};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    reports: Arc<DashMap<String, Report>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryDb {
    async fn get_report(&self, id: &str) -> Result<Option<Report>, AppError> {
        Ok(self.reports.get(id).map(|r| r.value().clone()))
    }

    async fn insert_report(&self, report: &Report) -> Result<(), AppError> {
        match self.reports.entry(report.id.clone()) {
            Entry::Occupied(_) => Err(AppError::AlreadyExists(format!("Report {}", report.id))),
            Entry::Vacant(slot) => {
                slot.insert(report.clone());
                Ok(())
            }
        }
    }

    async fn replace_report(
        &self,
        report: &Report,
        expected: ReportState,
    ) -> Result<Report, AppError> {
        let mut stored = self
            .reports
            .get_mut(&report.id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report.id)))?;

        if stored.state() != expected {
            return Err(AppError::Conflict(format!(
                "Report {} changed concurrently",
                report.id
            )));
        }

        // Stamped under the shard lock: readers see the resolution no
        // earlier than its timestamp.
        let next = stamp_commit(report, &stored, Utc::now());
        *stored = next.clone();
        Ok(next)
    }

    async fn list_reports_by_submitter(&self, email: &str) -> Result<Vec<Report>, AppError> {
        let mut reports: Vec<Report> = self
            .reports
            .iter()
            .filter(|r| r.submitter_email == email)
            .map(|r| r.value().clone())
            .collect();
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, AppError> {
        let mut reports: Vec<Report> = self.reports.iter().map(|r| r.value().clone()).collect();
        sort_newest_first(&mut reports);
        Ok(reports)
    }
}

#[async_trait]
impl UserDirectory for MemoryDb {
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::AlreadyExists(format!("User {}", user.email))),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(&user.email)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;
        *stored = user.clone();
        Ok(())
    }
}
