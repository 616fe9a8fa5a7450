// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Road-damage report model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Authority-driven workflow state of a report.
///
/// Variants are declared in workflow order so the derived `Ord`
/// matches `Unresolved < Reviewed < Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Progress {
    #[serde(alias = "Pending")]
    Unresolved,
    Reviewed,
    Resolved,
}

impl Progress {
    pub fn as_str(&self) -> &'static str {
        match self {
            Progress::Unresolved => "Unresolved",
            Progress::Reviewed => "Reviewed",
            Progress::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Progress {
    type Err = String;

    /// Parse a query-string value. Case-insensitive; `pending` is accepted
    /// for `Unresolved`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unresolved" | "pending" => Ok(Progress::Unresolved),
            "reviewed" => Ok(Progress::Reviewed),
            "resolved" => Ok(Progress::Resolved),
            other => Err(format!("unknown progress '{}'", other)),
        }
    }
}

/// Whether an authority has opened the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SeenStatus {
    Unseen,
    Seen,
}

impl fmt::Display for SeenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeenStatus::Unseen => f.write_str("Unseen"),
            SeenStatus::Seen => f.write_str("Seen"),
        }
    }
}

impl std::str::FromStr for SeenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unseen" => Ok(SeenStatus::Unseen),
            "seen" => Ok(SeenStatus::Seen),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Snapshot of the submitter's address at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoadLocation {
    pub address: String,
    #[serde(alias = "city")]
    pub district: String,
    pub pincode: String,
}

/// The `(progress, status)` pair a conditional write is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportState {
    pub progress: Progress,
    pub status: SeenStatus,
}

/// Stored report record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report ID (also used as document ID)
    pub id: String,
    /// Email of the submitting user (owner)
    pub submitter_email: String,
    /// Original file name as uploaded
    #[serde(default)]
    pub image_name: String,
    /// Opaque handle to the stored image
    pub image_url: String,
    /// Annotated image returned by the classifier, if any
    #[serde(default)]
    pub predicted_image_url: Option<String>,
    /// Classifier label ("Road", "Not Road", ...)
    pub classification: String,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
    pub road_location: RoadLocation,
    pub status: SeenStatus,
    pub progress: Progress,
    /// Upload time
    #[serde(alias = "uploaded_at")]
    pub created_at: DateTime<Utc>,
    /// Set by the transition into `Resolved`
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn state(&self) -> ReportState {
        ReportState {
            progress: self.progress,
            status: self.status,
        }
    }
}
