// ABOUTME: Presigned upload endpoint; the browser PUTs audio straight to storage
// ABOUTME: Only audio and video content types are accepted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{AppState, AuthedUser};
use crate::errors::{AppError, AppResult};
use crate::storage::PresignedUpload;

#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: String,
}

/// `POST /api/uploads/presign`
pub async fn presign(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(request): Json<PresignRequest>,
) -> AppResult<Json<PresignedUpload>> {
    if request.file_name.trim().is_empty() {
        return Err(AppError::invalid_input("File name is required"));
    }
    if !request.content_type.starts_with("audio/") && !request.content_type.starts_with("video/") {
        return Err(AppError::invalid_input(
            "Only audio and video uploads are allowed",
        ));
    }

    let presigned = state
        .storage
        .presign_upload(user.user_id, &request.file_name, &request.content_type)
        .await?;
    Ok(Json(presigned))
}
