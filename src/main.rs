// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SafeStreet API Server
//!
//! Accepts road-damage photo reports from citizens, classifies them with
//! an external model service and lets municipal authorities track repairs.

use safestreet::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb, ReportStore, UserDirectory},
    services::{Classifier, HttpClassifier},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.storage_backend, "Starting SafeStreet API");

    let (report_store, users): (Arc<dyn ReportStore>, Arc<dyn UserDirectory>) =
        match config.storage_backend {
            StorageBackend::Firestore => {
                let db = FirestoreDb::new(&config.gcp_project_id).await?;
                tracing::info!(project = %config.gcp_project_id, "Firestore connected");
                (Arc::new(db.clone()), Arc::new(db))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                let db = MemoryDb::new();
                (Arc::new(db.clone()), Arc::new(db))
            }
        };

    let classifier: Arc<dyn Classifier> = Arc::new(HttpClassifier::new(
        &config.classifier_url,
        Duration::from_secs(config.classifier_timeout_secs),
    )?);
    tracing::info!(url = %config.classifier_url, "Classifier client initialized");

    let port = config.port;
    let state = Arc::new(AppState::new(config, report_store, users, classifier));

    // Build router
    let app = safestreet::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("safestreet=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
