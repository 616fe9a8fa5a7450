// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the authenticated account.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Role, User};
use crate::services::ProfileUpdate;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me).put(update_me))
}

/// Account profile as returned to clients. Never includes the password
/// hash; address fields are only present for role `user`.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    /// Whether the account may upload reports yet
    pub address_complete: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let address_complete = user.role == Role::User && user.has_complete_address();
        let is_user = user.role == Role::User;
        Self {
            email: user.email,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            address: is_user.then_some(user.address),
            district: is_user.then_some(user.district),
            pincode: is_user.then_some(user.pincode),
            address_complete,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state.accounts.profile(&user.email).await?;
    Ok(Json(profile.into()))
}

#[derive(Deserialize, Validate)]
struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    first_name: Option<String>,
    #[validate(length(max = 100))]
    last_name: Option<String>,
    #[validate(length(max = 20))]
    phone_number: Option<String>,
    #[validate(length(max = 200))]
    address: Option<String>,
    #[serde(alias = "city")]
    #[validate(length(max = 100))]
    district: Option<String>,
    #[validate(length(max = 12))]
    pincode: Option<String>,
}

/// Partially update the current user's profile.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let update = ProfileUpdate {
        first_name: body.first_name,
        last_name: body.last_name,
        phone_number: body.phone_number,
        address: body.address,
        district: body.district,
        pincode: body.pincode,
    };

    let updated = state
        .accounts
        .update_profile(&user.actor(), &user.email, update)
        .await?;
    Ok(Json(updated.into()))
}
