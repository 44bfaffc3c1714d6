use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::AssetStore;

const AVATAR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg"];
const AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;
const DISPLAY_NAME_MAX: usize = 100;
const BIO_MAX: usize = 500;

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/avatar", post(upload_avatar))
        .route("/me/games", get(super::games::list_my_games))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    id: Uuid,
    created_at: String,
    updated_at: String,
    email: String,
    username: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    email_verified: bool,
    role: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMeRequest {
    display_name: Option<String>,
    bio: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AvatarResponse {
    avatar_url: String,
}

/// `GET /api/v1/users/me`
async fn get_me(AuthUser(caller): AuthUser) -> Json<MeResponse> {
    Json(me_response(&caller))
}

/// `PATCH /api/v1/users/me`
///
/// Only supplied fields change; sending an empty string clears a field.
async fn update_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let mut active: user::ActiveModel = caller.into();

    if let Some(display_name) = body.display_name {
        if display_name.len() > DISPLAY_NAME_MAX {
            return Err(AppError::BadRequest(format!(
                "Display name must be at most {DISPLAY_NAME_MAX} characters."
            )));
        }
        active.display_name = Set(Some(display_name).filter(|s| !s.is_empty()));
    }
    if let Some(bio) = body.bio {
        if bio.len() > BIO_MAX {
            return Err(AppError::BadRequest(format!(
                "Bio must be at most {BIO_MAX} characters."
            )));
        }
        active.bio = Set(Some(bio).filter(|s| !s.is_empty()));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(Json(me_response(&updated)))
}

/// `POST /api/v1/users/me/avatar`
///
/// Stores the image under the `avatars/` sibling of the game directories with
/// a generated name, so user-chosen file names never reach the disk.
async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?
        .ok_or_else(|| AppError::BadRequest("No file field provided.".to_string()))?;

    let file_name = field.file_name().unwrap_or_default().to_string();
    let extension = file_name.rsplit('.').next().unwrap_or_default().to_lowercase();
    if !AVATAR_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(
            "Unsupported file type. Allowed: PNG, JPG, GIF, SVG.".to_string(),
        ));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {e}")))?;
    if data.len() > AVATAR_MAX_BYTES {
        return Err(AppError::BadRequest(
            "File exceeds the 5 MB size limit.".to_string(),
        ));
    }

    let stored_name = format!("{}.{extension}", Uuid::new_v4());
    state
        .assets
        .place_avatar(&stored_name, &data)
        .await
        .map_err(AppError::Storage)?;

    // Best-effort removal of the replaced avatar
    if let Some(old) = &caller.avatar_url
        && let Err(err) = state.assets.remove_url(old).await
    {
        tracing::warn!(url = %old, error = %err, "failed to remove previous avatar");
    }

    let avatar_url = AssetStore::avatar_url(&stored_name);

    let mut active: user::ActiveModel = caller.into();
    active.avatar_url = Set(Some(avatar_url.clone()));
    active.updated_at = Set(Utc::now().fixed_offset());
    active.update(&state.db).await?;

    Ok(Json(AvatarResponse { avatar_url }))
}

fn me_response(u: &user::Model) -> MeResponse {
    MeResponse {
        id: u.id,
        created_at: u.created_at.to_string(),
        updated_at: u.updated_at.to_string(),
        email: u.email.clone(),
        username: u.username.clone(),
        display_name: u.display_name.clone(),
        avatar_url: u.avatar_url.clone(),
        bio: u.bio.clone(),
        email_verified: u.email_verified,
        role: u.role.clone(),
    }
}
