// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report orchestration: guard, load, transition, conditional write.
//!
//! Each method performs at most one write. A write that loses a race
//! surfaces as `AppError::Conflict`; the caller re-reads and decides
//! whether the transition still makes sense.

use crate::db::{ReportStore, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::{Progress, Report, SeenStatus};
use crate::services::classifier::Classifier;
use crate::workflow::{self, authorize, Actor, NewReport, Operation, WorkflowError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Optional filters for the authority report listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFilter {
    pub progress: Option<Progress>,
    pub status: Option<SeenStatus>,
}

impl ReportFilter {
    fn matches(&self, report: &Report) -> bool {
        self.progress.map_or(true, |p| report.progress == p)
            && self.status.map_or(true, |s| report.status == s)
    }
}

/// Dashboard counters over all reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportStats {
    pub total: u32,
    pub seen: u32,
    pub unseen: u32,
    pub unresolved: u32,
    pub reviewed: u32,
    pub resolved: u32,
}

impl ReportStats {
    pub fn from_reports(reports: &[Report]) -> Self {
        let mut stats = Self::default();
        for report in reports {
            stats.total += 1;
            match report.status {
                SeenStatus::Seen => stats.seen += 1,
                SeenStatus::Unseen => stats.unseen += 1,
            }
            match report.progress {
                Progress::Unresolved => stats.unresolved += 1,
                Progress::Reviewed => stats.reviewed += 1,
                Progress::Resolved => stats.resolved += 1,
            }
        }
        stats
    }
}

#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
    users: Arc<dyn UserDirectory>,
    classifier: Arc<dyn Classifier>,
    notification_grace: chrono::Duration,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        users: Arc<dyn UserDirectory>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            reports,
            users,
            classifier,
            notification_grace: chrono::Duration::zero(),
        }
    }

    /// How far behind the clock a notification watermark is placed.
    /// Covers commit latency and clock skew between server instances.
    pub fn with_notification_grace(mut self, grace: chrono::Duration) -> Self {
        self.notification_grace = grace;
        self
    }

    /// Classify an uploaded image and file it as a report for `actor`.
    ///
    /// Role and address are checked before the classifier is called so
    /// that a rejected caller never costs an inference request.
    pub async fn create_report(
        &self,
        actor: &Actor<'_>,
        upload: NewReport,
        image: Vec<u8>,
    ) -> Result<Report> {
        if actor.role != crate::models::Role::User {
            return Err(WorkflowError::Forbidden.into());
        }

        let submitter = self
            .users
            .get_user(actor.email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", actor.email)))?;

        authorize(
            actor,
            Operation::CreateReport {
                submitter: &submitter,
            },
        )?;

        let classification = self.classifier.classify(&upload.image_name, image).await?;

        let report = workflow::open_report(
            uuid::Uuid::new_v4().to_string(),
            &submitter,
            upload,
            classification,
            Utc::now(),
        )?;

        self.reports.insert_report(&report).await?;

        tracing::info!(
            report_id = %report.id,
            email = %report.submitter_email,
            confidence = report.confidence,
            "Report created"
        );

        Ok(report)
    }

    /// The caller's own reports, newest first.
    pub async fn list_own(&self, actor: &Actor<'_>) -> Result<Vec<Report>> {
        authorize(actor, Operation::ReadOwnReports)?;
        self.reports.list_reports_by_submitter(actor.email).await
    }

    /// All reports matching `filter`, newest first.
    pub async fn list_all(&self, actor: &Actor<'_>, filter: ReportFilter) -> Result<Vec<Report>> {
        authorize(actor, Operation::ReadAllReports)?;
        let reports = self.reports.list_reports().await?;
        Ok(reports.into_iter().filter(|r| filter.matches(r)).collect())
    }

    pub async fn stats(&self, actor: &Actor<'_>) -> Result<ReportStats> {
        authorize(actor, Operation::ViewStats)?;
        let reports = self.reports.list_reports().await?;
        Ok(ReportStats::from_reports(&reports))
    }

    /// Fetch one report. Users asking for someone else's report get
    /// `NotFound`, so report IDs do not leak.
    pub async fn get(&self, actor: &Actor<'_>, id: &str) -> Result<Report> {
        let report = self.load(id).await?;
        match authorize(
            actor,
            Operation::ReadReport {
                owner: &report.submitter_email,
            },
        ) {
            Ok(()) => Ok(report),
            Err(WorkflowError::Forbidden) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Flag a report as opened by an authority. No write happens when
    /// the flag is already set or the report is terminal.
    pub async fn mark_seen(&self, actor: &Actor<'_>, id: &str) -> Result<Report> {
        authorize(actor, Operation::MarkSeen)?;

        let current = self.load(id).await?;
        let next = workflow::mark_seen(&current);
        if next == current {
            return Ok(current);
        }

        let stored = self.reports.replace_report(&next, current.state()).await?;
        tracing::info!(report_id = %id, by = %actor.email, "Report marked seen");
        Ok(stored)
    }

    /// Move a report's progress forward.
    pub async fn set_progress(
        &self,
        actor: &Actor<'_>,
        id: &str,
        requested: Progress,
    ) -> Result<Report> {
        authorize(actor, Operation::SetProgress)?;

        let current = self.load(id).await?;
        let next = workflow::set_progress(&current, requested, Utc::now())?;

        let stored = self.reports.replace_report(&next, current.state()).await?;
        tracing::info!(
            report_id = %id,
            by = %actor.email,
            from = %current.progress,
            to = %stored.progress,
            "Report progress updated"
        );
        Ok(stored)
    }

    /// The caller's reports resolved since `last_checked_at`, plus the
    /// watermark to send on the next poll.
    ///
    /// The watermark is taken before the read and pulled back by the
    /// notification grace, so a resolution committing while this poll
    /// runs is reported by the next one. Reports inside the grace window
    /// can be delivered twice; clients dedupe by id.
    pub async fn newly_resolved(
        &self,
        actor: &Actor<'_>,
        last_checked_at: DateTime<Utc>,
    ) -> Result<(Vec<Report>, DateTime<Utc>)> {
        let checked_at = Utc::now() - self.notification_grace;
        let own = self.list_own(actor).await?;
        let resolved = workflow::derive_newly_resolved(&own, last_checked_at)
            .into_iter()
            .cloned()
            .collect();
        Ok((resolved, checked_at))
    }

    async fn load(&self, id: &str) -> Result<Report> {
        self.reports
            .get_report(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Report {} not found", id))
}
