// ABOUTME: HTTP surface: shared state, router assembly, and the auth extractor
// ABOUTME: Handlers return AppResult; AppError maps itself onto HTTP responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::database::Database;
use crate::errors::AppError;
use crate::jobs::JobQueue;
use crate::storage::ObjectStorage;
use crate::usage::GlobalLimits;

/// Account endpoints: register, login, verify
pub mod auth;
/// Episode lifecycle endpoints
pub mod episodes;
/// Style profile read and manual override endpoints
pub mod style_profile;
/// Presigned upload endpoint
pub mod uploads;
/// Budget and breaker status endpoint
pub mod usage;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthManager,
    pub queue: Arc<dyn JobQueue>,
    pub storage: Arc<dyn ObjectStorage>,
    pub global_limits: GlobalLimits,
}

/// The authenticated caller, extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(AppError::auth_required)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(AppError::auth_required)?;

        let claims = state.auth.validate_token(token)?;
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
        })
    }
}

/// Assemble the API router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/episodes", post(episodes::create).get(episodes::list))
        .route(
            "/api/episodes/:id",
            get(episodes::get_one).delete(episodes::delete),
        )
        .route("/api/episodes/:id/reprocess", post(episodes::reprocess))
        .route("/api/uploads/presign", post(uploads::presign))
        .route("/api/usage", get(usage::status))
        .route(
            "/api/style-profile",
            get(style_profile::get_profile).put(style_profile::update_profile),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
