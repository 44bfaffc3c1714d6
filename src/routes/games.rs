use axum::extract::{DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{EditForm, UploadForm};
use crate::entities::{GameType, game, game_like, user};
use crate::error::AppError;
use crate::services::GameService;
use crate::state::AppState;

/// Upload payload ceiling; multipart bodies above this are rejected by Axum.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Wraps an optional authenticated user (bearer token is optional for some routes).
struct OptionalAuth(Option<user::Model>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(u)) => Ok(Self(Some(u))),
            Err(_) => Ok(Self(None)),
        }
    }
}

/// Game management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_game).get(list_games))
        .route(
            "/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
        .route(
            "/{id}/like",
            post(like_game).delete(unlike_game).get(check_like),
        )
        .route("/{id}/play", post(record_play).get(play_game))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_offset")]
    offset: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

const fn default_offset() -> u64 {
    0
}

const fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    id: Uuid,
    title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameResponse {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    game_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    content: String,
    image: String,
    author_id: Option<String>,
    files: GameFiles,
    settings: GameSettings,
    likes: i64,
    plays: i64,
    game_dir_name: Option<String>,
    created_at: String,
    last_updated: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameFiles {
    main_file: Option<String>,
    asset_files: Vec<String>,
    thumbnails: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameSettings {
    width: i32,
    height: i32,
    fullscreen: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameSummaryResponse {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    image: String,
    likes: i64,
    plays: i64,
}

#[derive(Debug, Serialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
    total: u64,
    offset: u64,
    limit: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeStatusResponse {
    has_liked: bool,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct TextContentResponse {
    content: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /games` — Upload a new game (multipart).
async fn upload_game(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = UploadForm::from_multipart(multipart).await?;

    let created = GameService::upload(
        &state.db,
        &state.assets,
        &caller,
        &state.config.placeholder_image,
        form,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: created.id,
            title: created.title,
        }),
    ))
}

/// `GET /games` — List games, most liked first.
async fn list_games(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let total = game::Entity::find().count(&state.db).await?;

    let games = game::Entity::find()
        .order_by_desc(game::Column::Likes)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    Ok(Json(PaginatedResponse {
        data: games.into_iter().map(to_game_summary).collect::<Vec<_>>(),
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

/// `GET /games/:id` — Get a game by ID.
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = GameService::find_game(&state.db, id).await?;
    Ok(Json(to_game_response(found)))
}

/// `PUT /games/:id` — Edit a game (multipart, owner only).
async fn update_game(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = EditForm::from_multipart(multipart).await?;
    let updated = GameService::update(&state.db, &state.assets, &caller, id, form).await?;
    Ok(Json(to_game_response(updated)))
}

/// `DELETE /games/:id` — Delete a game and its files (owner only).
async fn delete_game(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    GameService::delete(&state.db, &state.assets, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/:id/like` — Like a game (once per user).
async fn like_game(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    GameService::find_game(&state.db, id).await?;

    let existing = find_like(&state, id, caller.id).await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already liked this game".to_string(),
        ));
    }

    game_like::ActiveModel {
        id: Set(Uuid::new_v4()),
        game_id: Set(id),
        user_id: Set(caller.id),
        created_at: Set(chrono::Utc::now().fixed_offset()),
    }
    .insert(&state.db)
    .await?;

    game::Entity::update_many()
        .col_expr(game::Column::Likes, Expr::col(game::Column::Likes).add(1))
        .filter(game::Column::Id.eq(id))
        .exec(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Game liked successfully".to_string(),
    }))
}

/// `DELETE /games/:id/like` — Remove a like; the counter never drops below 0.
async fn unlike_game(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    GameService::find_game(&state.db, id).await?;

    let existing = find_like(&state, id, caller.id)
        .await?
        .ok_or_else(|| AppError::BadRequest("You have not liked this game".to_string()))?;

    game_like::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;

    game::Entity::update_many()
        .col_expr(game::Column::Likes, Expr::col(game::Column::Likes).sub(1))
        .filter(game::Column::Id.eq(id))
        .filter(game::Column::Likes.gt(0))
        .exec(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Like removed successfully".to_string(),
    }))
}

/// `GET /games/:id/like` — Whether the caller has liked this game.
async fn check_like(
    State(state): State<AppState>,
    OptionalAuth(opt_user): OptionalAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let Some(caller) = opt_user else {
        return Ok(Json(LikeStatusResponse { has_liked: false }));
    };

    let has_liked = find_like(&state, id, caller.id).await?.is_some();
    Ok(Json(LikeStatusResponse { has_liked }))
}

/// `POST /games/:id/play` — Record a play.
async fn record_play(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = game::Entity::update_many()
        .col_expr(game::Column::Plays, Expr::col(game::Column::Plays).add(1))
        .filter(game::Column::Id.eq(id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Game not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Play recorded successfully".to_string(),
    }))
}

/// `GET /games/:id/play` — Serve the playable content.
///
/// Text adventures return their inline content as JSON; every other game
/// type streams the main file with an extension-based content type.
async fn play_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let found = GameService::find_game(&state.db, id).await?;

    if GameType::from_str(&found.game_type).is_some_and(GameType::is_text) {
        return Ok(Json(TextContentResponse {
            content: found.content,
        })
        .into_response());
    }

    let main_url = found
        .main_file
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Game file not found".to_string()))?;

    let path = state
        .assets
        .resolve_url(main_url)
        .ok_or_else(|| AppError::NotFound("Game file not found".to_string()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Game file not found".to_string()));
        }
        Err(e) => return Err(AppError::Storage(e.into())),
    };

    let content_type = content_type_for(main_url);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// ============================================================================
// Helpers
// ============================================================================

async fn find_like(
    state: &AppState,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<Option<game_like::Model>, AppError> {
    let existing = game_like::Entity::find()
        .filter(game_like::Column::GameId.eq(game_id))
        .filter(game_like::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?;
    Ok(existing)
}

/// Content type for a served game file, keyed on its extension.
fn content_type_for(url: &str) -> &'static str {
    let ext = url.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "js" => "application/javascript",
        "json" => "application/json",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "text/html",
    }
}

fn to_game_response(found: game::Model) -> GameResponse {
    let author_id = found.author_id();
    let asset_files = found.asset_file_list();
    let thumbnails = found.thumbnail_list();
    GameResponse {
        id: found.id,
        title: found.title,
        description: found.description,
        category: found.category,
        game_type: found.game_type,
        content: found.content,
        image: found.image,
        author_id,
        files: GameFiles {
            main_file: found.main_file,
            asset_files,
            thumbnails,
        },
        settings: GameSettings {
            width: found.settings_width,
            height: found.settings_height,
            fullscreen: found.settings_fullscreen,
        },
        likes: found.likes,
        plays: found.plays,
        game_dir_name: found.game_dir_name,
        created_at: found.created_at.to_string(),
        last_updated: found.last_updated.to_string(),
    }
}

fn to_game_summary(found: game::Model) -> GameSummaryResponse {
    GameSummaryResponse {
        id: found.id,
        title: found.title,
        description: found.description,
        category: found.category,
        image: found.image,
        likes: found.likes,
        plays: found.plays,
    }
}

/// `GET /users/me/games` — List the authenticated user's games.
///
/// # Errors
///
/// Returns [`AppError`] if the database query fails.
pub async fn list_my_games(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ownership = sea_orm::Condition::any()
        .add(game::Column::Author.eq(serde_json::Value::String(caller.id.to_string())))
        .add(game::Column::AuthorId.eq(caller.id.to_string()));

    let total = game::Entity::find()
        .filter(ownership.clone())
        .count(&state.db)
        .await?;

    let games = game::Entity::find()
        .filter(ownership)
        .order_by_desc(game::Column::LastUpdated)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    Ok(Json(PaginatedResponse {
        data: games.into_iter().map(to_game_summary).collect::<Vec<_>>(),
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}
