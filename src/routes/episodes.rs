// ABOUTME: Episode lifecycle endpoints: create, list, inspect, reprocess, delete
// ABOUTME: Creation validates the media source before anything is enqueued
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{AppState, AuthedUser};
use crate::errors::{AppError, AppResult};
use crate::jobs::EpisodeJob;
use crate::media::validate_external_url;
use crate::models::{ContentPiece, Episode, EpisodeSource, EpisodeStatus};
use crate::storage::validate_user_key;

const MAX_TITLE_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
pub struct CreateEpisodeRequest {
    pub title: String,
    /// Storage key of an uploaded file; mutually exclusive with `url`
    #[serde(default)]
    pub file_key: Option<String>,
    /// External media URL; mutually exclusive with `file_key`
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeDetail {
    #[serde(flatten)]
    pub episode: Episode,
    pub content_pieces: Vec<ContentPiece>,
}

fn parse_source(
    request: &CreateEpisodeRequest,
    user_id: Uuid,
) -> AppResult<EpisodeSource> {
    match (&request.file_key, &request.url) {
        (Some(file_key), None) => {
            validate_user_key(file_key, user_id)?;
            Ok(EpisodeSource::Upload {
                file_key: file_key.clone(),
            })
        }
        (None, Some(url)) => {
            let validated = validate_external_url(url)?;
            Ok(EpisodeSource::ExternalUrl {
                url: validated.into(),
            })
        }
        _ => Err(AppError::invalid_input(
            "Provide exactly one of file_key or url",
        )),
    }
}

async fn load_owned_episode(
    state: &AppState,
    episode_id: Uuid,
    user_id: Uuid,
) -> AppResult<Episode> {
    let episode = state
        .db
        .get_episode(episode_id)
        .await?
        .ok_or_else(|| AppError::not_found("Episode"))?;
    if episode.user_id != user_id {
        return Err(AppError::permission_denied(
            "Episode belongs to another user",
        ));
    }
    Ok(episode)
}

/// `POST /api/episodes`
pub async fn create(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(request): Json<CreateEpisodeRequest>,
) -> AppResult<(StatusCode, Json<Episode>)> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::invalid_input("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::invalid_input(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let source = parse_source(&request, user.user_id)?;
    let episode = Episode::new(user.user_id, title.to_owned(), source);
    state.db.create_episode(&episode).await?;
    state
        .queue
        .enqueue(EpisodeJob {
            episode_id: episode.id,
            user_id: user.user_id,
        })
        .await?;

    info!(episode_id = %episode.id, user_id = %user.user_id, "episode created and enqueued");
    Ok((StatusCode::CREATED, Json(episode)))
}

/// `GET /api/episodes`
pub async fn list(
    State(state): State<AppState>,
    user: AuthedUser,
) -> AppResult<Json<Vec<Episode>>> {
    Ok(Json(state.db.list_episodes(user.user_id).await?))
}

/// `GET /api/episodes/:id`
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(episode_id): Path<Uuid>,
) -> AppResult<Json<EpisodeDetail>> {
    let episode = load_owned_episode(&state, episode_id, user.user_id).await?;
    let content_pieces = state.db.list_content_pieces(episode_id).await?;
    Ok(Json(EpisodeDetail {
        episode,
        content_pieces,
    }))
}

/// `POST /api/episodes/:id/reprocess`
pub async fn reprocess(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(episode_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Episode>)> {
    let episode = load_owned_episode(&state, episode_id, user.user_id).await?;
    if episode.status != EpisodeStatus::Failed {
        return Err(AppError::conflict(
            "Only failed episodes can be reprocessed",
        ));
    }

    state
        .db
        .reset_episode_for_reprocess(episode_id, episode.source.initial_status())
        .await?;
    state
        .queue
        .enqueue(EpisodeJob {
            episode_id,
            user_id: user.user_id,
        })
        .await?;

    let episode = load_owned_episode(&state, episode_id, user.user_id).await?;
    info!(%episode_id, "episode reprocess enqueued");
    Ok((StatusCode::ACCEPTED, Json(episode)))
}

/// `DELETE /api/episodes/:id`
pub async fn delete(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(episode_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let episode = load_owned_episode(&state, episode_id, user.user_id).await?;

    // Storage cleanup is best-effort; the database rows always go
    if let EpisodeSource::Upload { file_key } = &episode.source {
        if let Err(e) = state.storage.delete(file_key).await {
            warn!(%episode_id, error = %e, "failed to delete stored media");
        }
    }
    state.db.delete_episode(episode_id).await?;

    info!(%episode_id, "episode deleted");
    Ok(StatusCode::NO_CONTENT)
}
