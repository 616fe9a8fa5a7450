// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SafeStreet: road-damage reporting backend
//!
//! Citizens upload photographs of damaged roads, an external classifier
//! labels them, and municipal authorities review and resolve the reports.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod workflow;

use config::Config;
use db::{ReportStore, UserDirectory};
use services::{AccountService, Classifier, ReportService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub accounts: AccountService,
    pub reports: ReportService,
}

impl AppState {
    /// Wire services over the given storage and classifier collaborators.
    pub fn new(
        config: Config,
        report_store: Arc<dyn ReportStore>,
        users: Arc<dyn UserDirectory>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let accounts = AccountService::new(users.clone(), config.authority_enrollment_code.clone());
        // Anything past a day is a misconfiguration; clamp rather than overflow.
        let grace_secs = config.notification_grace_secs.min(86_400) as i64;
        let reports = ReportService::new(report_store, users, classifier)
            .with_notification_grace(chrono::Duration::seconds(grace_secs));
        Self {
            config,
            accounts,
            reports,
        }
    }
}
