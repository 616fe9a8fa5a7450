// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login and self-service profile edits.

use crate::db::UserDirectory;
use crate::error::{AppError, Result};
use crate::models::{Role, User};
use crate::services::password::{hash_password, verify_dummy, verify_password};
use crate::time_utils::format_utc_rfc3339;
use crate::workflow::{authorize, authorize_registration, Actor, Operation};
use std::sync::Arc;

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub authority_code: Option<String>,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
}

impl ProfileUpdate {
    /// Drop values that must never blank a field.
    fn normalized(mut self) -> Self {
        if self.first_name.as_deref().is_some_and(|v| v.trim().is_empty()) {
            self.first_name = None;
        }
        if self.last_name.as_deref().is_some_and(|v| v.trim().is_empty()) {
            self.last_name = None;
        }
        self
    }

    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
            && self.district.is_none()
            && self.pincode.is_none()
    }

    fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.phone_number {
            user.phone_number = v;
        }
        if let Some(v) = self.address {
            user.address = v;
        }
        if let Some(v) = self.district {
            user.district = v;
        }
        if let Some(v) = self.pincode {
            user.pincode = v;
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserDirectory>,
    enrollment_code: String,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserDirectory>, enrollment_code: String) -> Self {
        Self {
            users,
            enrollment_code,
        }
    }

    /// Register a new account. Address fields start empty.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        authorize_registration(
            registration.role,
            registration.authority_code.as_deref(),
            &self.enrollment_code,
        )
        .inspect_err(|_| {
            tracing::warn!(
                email = %registration.email,
                "Rejected authority registration with invalid enrollment code"
            );
        })?;

        let user = User {
            email: registration.email,
            password_hash: hash_password(&registration.password)?,
            role: registration.role,
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone_number: registration.phone_number,
            address: String::new(),
            district: String::new(),
            pincode: String::new(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        self.users.insert_user(&user).await?;
        tracing::info!(email = %user.email, role = %user.role, "User registered");
        Ok(user)
    }

    /// Check credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let Some(user) = self.users.get_user(email).await? else {
            verify_dummy(password)?;
            tracing::debug!(email, "Login rejected: unknown email");
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(email, "Login rejected: wrong password");
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    pub async fn profile(&self, email: &str) -> Result<User> {
        self.users
            .get_user(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))
    }

    /// Apply a partial update to the account `target`.
    pub async fn update_profile(
        &self,
        actor: &Actor<'_>,
        target: &str,
        update: ProfileUpdate,
    ) -> Result<User> {
        authorize(actor, Operation::UpdateProfile { target })?;

        let update = update.normalized();
        if update.is_empty() {
            return Err(AppError::BadRequest("No update data provided".to_string()));
        }

        let mut user = self.profile(target).await?;
        update.apply(&mut user);
        self.users.update_user(&user).await?;

        tracing::info!(email = %target, "Profile updated");
        Ok(user)
    }
}
