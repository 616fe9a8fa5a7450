// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod classifier;
pub mod password;
pub mod reports;

pub use accounts::{AccountService, ProfileUpdate, Registration};
pub use classifier::{Classifier, HttpClassifier};
pub use reports::{ReportFilter, ReportService, ReportStats};
