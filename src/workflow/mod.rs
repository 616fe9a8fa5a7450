// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report workflow core: lifecycle transitions, role checks and
//! notification derivation.
//!
//! Everything in here is synchronous and free of I/O. Callers load the
//! current values from storage, ask this module what the next value is,
//! and persist the answer with a conditional write.

pub mod access;
pub mod lifecycle;
pub mod notify;

pub use access::{authorize, authorize_registration, Actor, Operation};
pub use lifecycle::{
    can_transition_progress, is_terminal, mark_resolved, mark_seen, open_report, set_progress,
    ClassificationResult, NewReport,
};
pub use notify::derive_newly_resolved;

use crate::models::Progress;

/// Errors produced by the workflow core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Cannot move progress from {from} to {to}")]
    InvalidTransition { from: Progress, to: Progress },

    #[error("Operation not permitted for this role")]
    Forbidden,

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Image is not classified as a road: {0}")]
    InvalidClassification(String),
}
