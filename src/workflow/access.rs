// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-based access checks for report and profile operations.

use super::WorkflowError;
use crate::models::{Role, User};
use subtle::ConstantTimeEq;

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub email: &'a str,
    pub role: Role,
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// File a new report as `submitter` (the caller's own record).
    CreateReport { submitter: &'a User },
    ReadOwnReports,
    ReadAllReports,
    /// Read a single report owned by `owner`.
    ReadReport { owner: &'a str },
    ViewStats,
    MarkSeen,
    SetProgress,
    /// Change profile fields of the account identified by `target`.
    UpdateProfile { target: &'a str },
}

/// Decide whether `actor` may perform `op`.
///
/// Role mismatches are `Forbidden`. A `user` filing a report without a
/// complete address gets `PreconditionFailed` instead, so the client can
/// send them to their profile.
pub fn authorize(actor: &Actor<'_>, op: Operation<'_>) -> Result<(), WorkflowError> {
    match (actor.role, op) {
        (Role::User, Operation::CreateReport { submitter }) => {
            if submitter.email != actor.email || submitter.role != Role::User {
                return Err(WorkflowError::Forbidden);
            }
            if !submitter.has_complete_address() {
                return Err(WorkflowError::PreconditionFailed(
                    "Complete your address details before uploading images".to_string(),
                ));
            }
            Ok(())
        }
        (Role::User, Operation::ReadOwnReports) => Ok(()),
        (Role::User, Operation::ReadReport { owner }) if owner == actor.email => Ok(()),
        (Role::Authority, Operation::ReadAllReports)
        | (Role::Authority, Operation::ReadReport { .. })
        | (Role::Authority, Operation::ViewStats)
        | (Role::Authority, Operation::MarkSeen)
        | (Role::Authority, Operation::SetProgress) => Ok(()),
        (_, Operation::UpdateProfile { target }) if target == actor.email => Ok(()),
        _ => Err(WorkflowError::Forbidden),
    }
}

/// Check whether an account may be registered with `role`.
///
/// `authority` accounts must present the enrollment code; an empty
/// configured code disables authority registration entirely.
pub fn authorize_registration(
    role: Role,
    presented_code: Option<&str>,
    enrollment_code: &str,
) -> Result<(), WorkflowError> {
    match role {
        Role::User => Ok(()),
        Role::Authority => {
            let presented = presented_code.unwrap_or("");
            let matches: bool = presented
                .as_bytes()
                .ct_eq(enrollment_code.as_bytes())
                .into();
            if enrollment_code.is_empty() || !matches {
                return Err(WorkflowError::Forbidden);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_user_needs_no_code() {
        assert!(authorize_registration(Role::User, None, "AUTH123").is_ok());
    }

    #[test]
    fn test_registration_authority_code() {
        assert!(authorize_registration(Role::Authority, Some("AUTH123"), "AUTH123").is_ok());
        assert_eq!(
            authorize_registration(Role::Authority, Some("AUTH12"), "AUTH123"),
            Err(WorkflowError::Forbidden)
        );
        assert_eq!(
            authorize_registration(Role::Authority, None, "AUTH123"),
            Err(WorkflowError::Forbidden)
        );
    }

    #[test]
    fn test_registration_disabled_without_code() {
        assert_eq!(
            authorize_registration(Role::Authority, Some(""), ""),
            Err(WorkflowError::Forbidden)
        );
    }

    #[test]
    fn test_profile_update_own_record_only() {
        let actor = Actor {
            email: "a@example.com",
            role: Role::Authority,
        };
        assert!(authorize(
            &actor,
            Operation::UpdateProfile {
                target: "a@example.com"
            }
        )
        .is_ok());
        assert_eq!(
            authorize(
                &actor,
                Operation::UpdateProfile {
                    target: "b@example.com"
                }
            ),
            Err(WorkflowError::Forbidden)
        );
    }
}
