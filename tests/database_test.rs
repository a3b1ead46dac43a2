// ABOUTME: Persistence layer tests against file-backed and in-memory databases
// ABOUTME: Focuses on round trips and the delete cascade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

mod common;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use castcraft::database::Database;
use castcraft::models::{
    Episode, EpisodeSource, EpisodeStatus, PieceStatus, Platform, UsageOperation, UsageRecord,
};

use common::{create_test_database, create_upload_episode, create_verified_user, insert_piece};

#[tokio::test]
async fn test_file_backed_database_is_created_on_open() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("castcraft.db");
    let url = format!("sqlite://{}", path.display());

    let db = Database::new(&url).await?;
    db.migrate().await?;
    assert!(path.exists());

    // Data written through one handle is visible through another
    let user = create_verified_user(&db).await?;
    let reopened = Database::new(&url).await?;
    assert!(reopened.get_user(user.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_external_url_episode_round_trips() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_verified_user(&db).await?;

    let episode = Episode::new(
        user.id,
        "From the feed".to_owned(),
        EpisodeSource::ExternalUrl {
            url: "https://example.com/ep1.mp3".to_owned(),
        },
    );
    db.create_episode(&episode).await?;

    let stored = db.get_episode(episode.id).await?.expect("episode exists");
    assert_eq!(stored.status, EpisodeStatus::Transcribing);
    assert_eq!(
        stored.source,
        EpisodeSource::ExternalUrl {
            url: "https://example.com/ep1.mp3".to_owned(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_list_episodes_is_scoped_to_the_user() -> Result<()> {
    let db = create_test_database().await?;
    let alice = create_verified_user(&db).await?;
    let bob = create_verified_user(&db).await?;
    create_upload_episode(&db, alice.id).await?;
    create_upload_episode(&db, alice.id).await?;
    create_upload_episode(&db, bob.id).await?;

    assert_eq!(db.list_episodes(alice.id).await?.len(), 2);
    assert_eq!(db.list_episodes(bob.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_episode_cascades() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_verified_user(&db).await?;
    let episode = create_upload_episode(&db, user.id).await?;

    insert_piece(
        &db,
        user.id,
        episode.id,
        Platform::Twitter,
        PieceStatus::Generated,
        "a post",
    )
    .await?;
    let record = UsageRecord {
        id: Uuid::new_v4(),
        user_id: user.id,
        episode_id: Some(episode.id),
        operation: UsageOperation::Transcription,
        input_tokens: 0,
        output_tokens: 0,
        cost_cents: 6,
        model: "whisper-1".to_owned(),
        created_at: Utc::now(),
    };
    db.record_usage(&record, 100).await?;

    db.delete_episode(episode.id).await?;

    assert!(db.get_episode(episode.id).await?.is_none());
    assert_eq!(db.count_content_pieces(episode.id).await?, 0);
    assert_eq!(db.count_usage_records_for_episode(episode.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_piece_status_update_persists() -> Result<()> {
    let db = create_test_database().await?;
    let user = create_verified_user(&db).await?;
    let episode = create_upload_episode(&db, user.id).await?;
    let piece = insert_piece(
        &db,
        user.id,
        episode.id,
        Platform::Linkedin,
        PieceStatus::Generated,
        "draft",
    )
    .await?;

    db.update_content_piece_status(piece.id, PieceStatus::Edited)
        .await?;
    let pieces = db.list_content_pieces(episode.id).await?;
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].status, PieceStatus::Edited);
    Ok(())
}
