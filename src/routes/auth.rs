// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and logout routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::Role;
use crate::routes::users::UserResponse;
use crate::services::Registration;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    first_name: String,
    #[validate(length(min = 1, max = 100))]
    last_name: String,
    #[validate(length(min = 1, max = 20))]
    phone_number: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
    role: Role,
    #[serde(default)]
    authority_code: Option<String>,
}

/// Register a new account.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = state
        .accounts
        .register(Registration {
            first_name: body.first_name,
            last_name: body.last_name,
            phone_number: body.phone_number,
            email: body.email,
            password: body.password,
            role: body.role,
            authority_code: body.authority_code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    /// Session JWT, also set as an HttpOnly cookie
    pub token: String,
    pub user: UserResponse,
}

/// Build the session cookie. `Secure` unless the frontend is plain HTTP.
fn session_cookie(value: String, frontend_url: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(frontend_url.starts_with("https://"))
        .build()
}

/// Check credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let user = state.accounts.login(&body.email, &body.password).await?;

    let token = create_jwt(&user.email, user.role, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(email = %user.email, role = %user.role, "User logged in");

    let jar = jar.add(session_cookie(token.clone(), &state.config.frontend_url));
    Ok((
        jar,
        Json(LoginResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Logout - clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    let removal = session_cookie(String::new(), &state.config.frontend_url);
    (StatusCode::NO_CONTENT, jar.remove(removal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".to_string(), "https://safestreet.example.com");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let local = session_cookie("tok".to_string(), "http://localhost:3000");
        assert_eq!(local.secure(), Some(false));
    }

    #[test]
    fn test_register_request_validation() {
        let body: RegisterRequest = serde_json::from_value(serde_json::json!({
            "first_name": "Alice",
            "last_name": "Rao",
            "phone_number": "9000000000",
            "email": "not-an-email",
            "password": "short",
            "role": "user"
        }))
        .unwrap();
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
