// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod report;
pub mod user;

pub use report::{Progress, Report, ReportState, RoadLocation, SeenStatus};
pub use user::{Role, User};
