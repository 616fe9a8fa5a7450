// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolved-report notifications against a client-held watermark.

use super::lifecycle::is_terminal;
use crate::models::Report;
use chrono::{DateTime, Utc};

/// Select the reports that became `Resolved` after `last_checked_at`.
///
/// `reports` must already be scoped to one submitter. Reports resolved
/// before `resolved_at` was recorded are always included; the client
/// advancing its watermark after display keeps them from repeating.
///
/// Newest `created_at` first.
pub fn derive_newly_resolved(reports: &[Report], last_checked_at: DateTime<Utc>) -> Vec<&Report> {
    let mut resolved: Vec<&Report> = reports
        .iter()
        .filter(|r| is_terminal(r))
        .filter(|r| r.resolved_at.map_or(true, |at| at > last_checked_at))
        .collect();

    resolved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    resolved
}
