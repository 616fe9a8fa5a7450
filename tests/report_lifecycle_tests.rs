// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report state machine tests over the pure workflow core.

use chrono::{Duration, Utc};
use safestreet::models::{Progress, SeenStatus};
use safestreet::workflow::{
    can_transition_progress, is_terminal, mark_resolved, mark_seen, set_progress, WorkflowError,
};

mod common;
use common::test_report;

const ALL: [Progress; 3] = [Progress::Unresolved, Progress::Reviewed, Progress::Resolved];

#[test]
fn test_progress_only_moves_forward() {
    for from in ALL {
        for to in ALL {
            assert_eq!(
                can_transition_progress(from, to),
                to > from,
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn test_full_lifecycle() {
    let now = Utc::now();
    let report = test_report("r1", "alice@example.com", Progress::Unresolved, now, None);
    assert!(!is_terminal(&report));

    let seen = mark_seen(&report);
    assert_eq!(seen.status, SeenStatus::Seen);
    assert_eq!(seen.progress, Progress::Unresolved);

    let reviewed = set_progress(&seen, Progress::Reviewed, now).unwrap();
    assert_eq!(reviewed.progress, Progress::Reviewed);
    assert_eq!(reviewed.resolved_at, None);

    let later = now + Duration::hours(3);
    let resolved = set_progress(&reviewed, Progress::Resolved, later).unwrap();
    assert!(is_terminal(&resolved));
    assert_eq!(resolved.resolved_at, Some(later));
    assert_eq!(resolved.status, SeenStatus::Seen);
}

#[test]
fn test_unresolved_can_skip_to_resolved() {
    let now = Utc::now();
    let report = test_report("r1", "alice@example.com", Progress::Unresolved, now, None);
    let resolved = mark_resolved(&report, now).unwrap();
    assert_eq!(resolved.progress, Progress::Resolved);
    assert_eq!(resolved.status, SeenStatus::Unseen);
}

#[test]
fn test_resolved_is_terminal() {
    let now = Utc::now();
    let report = test_report("r1", "alice@example.com", Progress::Resolved, now, Some(now));

    for to in ALL {
        assert_eq!(
            set_progress(&report, to, now + Duration::minutes(1)),
            Err(WorkflowError::InvalidTransition {
                from: Progress::Resolved,
                to
            })
        );
    }

    // Unseen stays unseen once the report is closed.
    assert_eq!(mark_seen(&report), report);
}

#[test]
fn test_backwards_and_repeated_transitions_rejected() {
    let now = Utc::now();
    let reviewed = test_report("r1", "alice@example.com", Progress::Reviewed, now, None);

    assert!(matches!(
        set_progress(&reviewed, Progress::Unresolved, now),
        Err(WorkflowError::InvalidTransition { .. })
    ));
    assert!(matches!(
        set_progress(&reviewed, Progress::Reviewed, now),
        Err(WorkflowError::InvalidTransition { .. })
    ));
}

#[test]
fn test_mark_seen_idempotent() {
    let now = Utc::now();
    let report = test_report("r1", "alice@example.com", Progress::Reviewed, now, None);
    let once = mark_seen(&report);
    let twice = mark_seen(&once);
    assert_eq!(once, twice);
    assert_eq!(twice.progress, Progress::Reviewed);
}
