// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report lifecycle engine.
//!
//! A report lives on two independent axes:
//! - `progress`: `Unresolved -> Reviewed -> Resolved`, forward only
//! - `status`: `Unseen -> Seen`, one way
//!
//! `Resolved` is terminal for both axes.

use super::access::{authorize, Actor, Operation};
use super::WorkflowError;
use crate::models::{Progress, Report, RoadLocation, SeenStatus, User};
use chrono::{DateTime, Utc};

/// Output of the external classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Only road-surface images may be filed as reports.
    pub fn is_road(&self) -> bool {
        self.label.trim().eq_ignore_ascii_case("road")
    }
}

/// Upload metadata supplied by the submitter.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub image_name: String,
    pub image_url: String,
    pub predicted_image_url: Option<String>,
}

/// Whether `requested` is a strictly forward move from `current`.
pub fn can_transition_progress(current: Progress, requested: Progress) -> bool {
    requested > current
}

pub fn is_terminal(report: &Report) -> bool {
    report.progress == Progress::Resolved
}

/// Move the progress axis forward to `requested`.
///
/// Entering `Resolved` stamps `resolved_at` with `now`.
pub fn set_progress(
    report: &Report,
    requested: Progress,
    now: DateTime<Utc>,
) -> Result<Report, WorkflowError> {
    if !can_transition_progress(report.progress, requested) {
        return Err(WorkflowError::InvalidTransition {
            from: report.progress,
            to: requested,
        });
    }

    let mut next = report.clone();
    next.progress = requested;
    if requested == Progress::Resolved {
        next.resolved_at = Some(now);
    }
    Ok(next)
}

pub fn mark_resolved(report: &Report, now: DateTime<Utc>) -> Result<Report, WorkflowError> {
    set_progress(report, Progress::Resolved, now)
}

/// Flag the report as opened by an authority.
///
/// Idempotent. A terminal report is returned unchanged, even if it was
/// resolved without ever being marked seen.
pub fn mark_seen(report: &Report) -> Report {
    let mut next = report.clone();
    if !is_terminal(report) {
        next.status = SeenStatus::Seen;
    }
    next
}

/// Build a new report in the initial `(Unresolved, Unseen)` state.
///
/// The submitter must be a `user` with a complete address, and the
/// classification must be well-formed and road-like. The address is
/// copied so later profile edits do not move existing reports.
pub fn open_report(
    id: String,
    submitter: &User,
    upload: NewReport,
    classification: ClassificationResult,
    now: DateTime<Utc>,
) -> Result<Report, WorkflowError> {
    let actor = Actor {
        email: &submitter.email,
        role: submitter.role,
    };
    authorize(&actor, Operation::CreateReport { submitter })?;

    if !classification.confidence.is_finite() || !(0.0..=1.0).contains(&classification.confidence)
    {
        return Err(WorkflowError::ClassificationUnavailable(format!(
            "confidence {} outside [0, 1]",
            classification.confidence
        )));
    }
    if !classification.is_road() {
        return Err(WorkflowError::InvalidClassification(classification.label));
    }

    Ok(Report {
        id,
        submitter_email: submitter.email.clone(),
        image_name: upload.image_name,
        image_url: upload.image_url,
        predicted_image_url: upload.predicted_image_url,
        classification: classification.label,
        confidence: classification.confidence,
        road_location: RoadLocation {
            address: submitter.address.clone(),
            district: submitter.district.clone(),
            pincode: submitter.pincode.clone(),
        },
        status: SeenStatus::Unseen,
        progress: Progress::Unresolved,
        created_at: now,
        resolved_at: None,
    })
}
