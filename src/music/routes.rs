//! Music API Routes
//!
//! HTTP endpoint definitions for the music catalog.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Extension, Multipart, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::owner_middleware;
use crate::api::{parse_uuid, MultipartForm, SuccessResponse, ValidatedJson};
use crate::auth::{TokenService, UserClaims};
use crate::error::{AppError, AppResult};
use crate::media::MediaStore;

use super::model::{LikeChange, MetadataChanges, Music};
use super::store::MusicStore;

/// Folder for uploaded audio files
const MUSIC_FOLDER: &str = "musics";

/// Folder for uploaded poster images
const POSTER_FOLDER: &str = "posters";

/// Shared state of the music service
#[derive(Clone)]
pub struct MusicState {
    pub musics: Arc<dyn MusicStore>,
    pub media: Arc<dyn MediaStore>,
    pub tokens: TokenService,
}

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveMusicsByIdsRequest {
    #[serde(default)]
    pub musics_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMusicMetadataRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "shortDesc must not be empty"))]
    pub short_desc: Option<String>,
}

/// Text fields of the upload form
#[derive(Debug, Validate)]
struct UploadMusicFields {
    #[validate(length(min = 1, message = "title is required"))]
    title: String,
    #[validate(length(min = 1, message = "shortDesc is required"))]
    short_desc: String,
}

// =========================================================================
// Music Router
// =========================================================================

/// Create the music router.
///
/// Every route expects [`UserClaims`] in the request extensions, so the
/// caller layers the bearer authentication on top.
pub fn create_router() -> Router<MusicState> {
    let owner_routes = Router::new()
        .route(
            "/updateMusicMetadata/:owner_id/:music_id",
            post(update_music_metadata),
        )
        .route("/changeMusicPoster/:owner_id/:music_id", post(change_music_poster))
        .route_layer(middleware::from_fn(owner_middleware));

    Router::new()
        .route("/getMusics", get(get_musics))
        .route("/getMusicById/:music_id", get(get_music_by_id))
        .route("/likeMusic/:music_id", post(like_music))
        .route("/unlikeMusic/:music_id", post(unlike_music))
        .route("/retrieveMusicsByIds", post(retrieve_musics_by_ids))
        .route("/uploadMusic", post(upload_music))
        .merge(owner_routes)
}

// =========================================================================
// GET /getMusics
// =========================================================================

async fn get_musics(State(state): State<MusicState>) -> AppResult<Json<Vec<Music>>> {
    Ok(Json(state.musics.list().await?))
}

// =========================================================================
// GET /getMusicById/:music_id
// =========================================================================

async fn get_music_by_id(
    State(state): State<MusicState>,
    Path(music_id): Path<String>,
) -> AppResult<Json<Music>> {
    let id = parse_uuid(&music_id, "music id")?;

    let music = state
        .musics
        .find(id)
        .await?
        .ok_or(AppError::MusicNotFound(music_id))?;

    Ok(Json(music))
}

// =========================================================================
// POST /likeMusic/:music_id, POST /unlikeMusic/:music_id
// =========================================================================

async fn like_music(
    State(state): State<MusicState>,
    Path(music_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    change_likes(&state, music_id, LikeChange::Like).await
}

async fn unlike_music(
    State(state): State<MusicState>,
    Path(music_id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    change_likes(&state, music_id, LikeChange::Unlike).await
}

async fn change_likes(
    state: &MusicState,
    music_id: String,
    change: LikeChange,
) -> AppResult<Json<SuccessResponse>> {
    let id = parse_uuid(&music_id, "music id")?;

    let music = state
        .musics
        .change_likes(id, change)
        .await?
        .ok_or(AppError::MusicNotFound(music_id))?;

    tracing::debug!(music_id = %music.id, likes = music.likes, change = ?change, "Likes updated");
    Ok(SuccessResponse::ok())
}

// =========================================================================
// POST /retrieveMusicsByIds
// =========================================================================

/// Documents in request order; any unknown id fails the whole request
async fn retrieve_musics_by_ids(
    State(state): State<MusicState>,
    ValidatedJson(request): ValidatedJson<RetrieveMusicsByIdsRequest>,
) -> AppResult<Json<Vec<Music>>> {
    let mut musics = Vec::with_capacity(request.musics_ids.len());

    for raw_id in request.musics_ids {
        let id = parse_uuid(&raw_id, "music id")?;
        let music = state
            .musics
            .find(id)
            .await?
            .ok_or(AppError::MusicNotFound(raw_id))?;
        musics.push(music);
    }

    Ok(Json(musics))
}

// =========================================================================
// POST /uploadMusic
// =========================================================================

async fn upload_music(
    State(state): State<MusicState>,
    Extension(claims): Extension<UserClaims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let mut form = MultipartForm::read(multipart).await?;

    let fields = UploadMusicFields {
        title: form.text("title"),
        short_desc: form.text("shortDesc"),
    };
    fields.validate()?;

    let file = form
        .take_file("file", MUSIC_FOLDER)
        .ok_or_else(|| AppError::InvalidRequest("file is required".to_string()))?;

    let file_url = state.media.put(file).await?;

    let music = Music::new(claims.user_id, fields.title, fields.short_desc, file_url);
    state.musics.insert(&music).await?;

    tracing::info!(music_id = %music.id, artist_id = %music.artist_id, "Music uploaded");
    Ok(SuccessResponse::ok())
}

// =========================================================================
// POST /updateMusicMetadata/:owner_id/:music_id
// =========================================================================

async fn update_music_metadata(
    State(state): State<MusicState>,
    Path((owner_id, music_id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<UpdateMusicMetadataRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let id = parse_uuid(&music_id, "music id")?;

    let changes = MetadataChanges {
        title: request.title,
        short_desc: request.short_desc,
    };

    state
        .musics
        .update_metadata(id, &owner_id, &changes)
        .await?
        .ok_or(AppError::MusicNotFound(music_id))?;

    Ok(SuccessResponse::ok())
}

// =========================================================================
// POST /changeMusicPoster/:owner_id/:music_id
// =========================================================================

async fn change_music_poster(
    State(state): State<MusicState>,
    Path((owner_id, music_id)): Path<(String, String)>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let id = parse_uuid(&music_id, "music id")?;

    // Don't store a poster for a music the owner doesn't have
    state
        .musics
        .find(id)
        .await?
        .filter(|music| music.artist_id == owner_id)
        .ok_or_else(|| AppError::MusicNotFound(music_id.clone()))?;

    let mut form = MultipartForm::read(multipart).await?;
    let poster = form
        .take_file("poster", POSTER_FOLDER)
        .ok_or_else(|| AppError::InvalidRequest("poster is required".to_string()))?;

    let poster_url = state.media.put(poster).await?;

    state
        .musics
        .set_poster(id, &owner_id, &poster_url)
        .await?
        .ok_or(AppError::MusicNotFound(music_id))?;

    Ok(SuccessResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieve_request_deserialize() {
        let json = r#"{ "musicsIds": ["a", "b"] }"#;
        let request: RetrieveMusicsByIdsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.musics_ids, vec!["a", "b"]);

        let request: RetrieveMusicsByIdsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.musics_ids.is_empty());
    }

    #[test]
    fn test_metadata_request_validation() {
        let request: UpdateMusicMetadataRequest =
            serde_json::from_str(r#"{ "title": "New title" }"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.short_desc.is_none());

        let request: UpdateMusicMetadataRequest =
            serde_json::from_str(r#"{ "title": "" }"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_upload_fields_validation() {
        let fields = UploadMusicFields {
            title: "Song".to_string(),
            short_desc: String::new(),
        };
        assert!(fields.validate().is_err());
    }
}
