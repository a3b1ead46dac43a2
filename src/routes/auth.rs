// ABOUTME: Account endpoints: registration, login, and email verification
// ABOUTME: Passwords are bcrypt-hashed; sessions are stateless JWTs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::User;

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    /// Delivered in the response until email sending exists
    pub verification_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let email = request.email.trim().to_ascii_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(AppError::invalid_input("Invalid email address"));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("Email is already registered"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
    let user = User::new(email, password_hash);
    let verification_token = Uuid::new_v4().to_string();
    state.db.create_user(&user, &verification_token).await?;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            verification_token,
        }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = request.email.trim().to_ascii_lowercase();
    let user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

    let valid = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;
    if !valid {
        return Err(AppError::auth_invalid("Invalid email or password"));
    }

    let token = state.auth.generate_token(&user)?;
    Ok(Json(LoginResponse { token }))
}

/// `POST /api/auth/verify`
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let user_id = state
        .db
        .verify_email(&request.token)
        .await?
        .ok_or_else(|| AppError::not_found("Verification token"))?;

    info!(%user_id, "email verified");
    Ok(Json(VerifyResponse { verified: true }))
}
