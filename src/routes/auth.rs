use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{jwt, password};
use crate::entities::{auth_provider, user};
use crate::error::AppError;
use crate::state::AppState;

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/email", post(signup_email))
        .route("/signin/email", post(signin_email))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Issued on both signup and signin: the profile plus a bearer token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub email_verified: bool,
    pub role: String,
    pub created_at: String,
}

impl From<&user::Model> for UserResponse {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            avatar_url: u.avatar_url.clone(),
            bio: u.bio.clone(),
            email_verified: u.email_verified,
            role: u.role.clone(),
            created_at: u.created_at.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/auth/signup/email`
///
/// Creates the account and its email credential row in one transaction, then
/// issues a token so the client is signed in immediately.
async fn signup_email(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim().to_lowercase();
    let username = body.username.trim().to_string();

    password::validate_email(&email).map_err(AppError::BadRequest)?;
    password::validate_username(&username).map_err(AppError::BadRequest)?;
    password::validate_password(&body.password).map_err(AppError::BadRequest)?;

    // One lookup covers both uniqueness rules; the conflict message names
    // whichever field the caller actually collided on.
    let taken = user::Entity::find()
        .filter(
            sea_orm::Condition::any()
                .add(user::Column::Email.eq(&email))
                .add(user::Column::Username.eq(&username)),
        )
        .one(&state.db)
        .await?;
    if let Some(existing) = taken {
        let detail = if existing.email == email {
            "Email already registered."
        } else {
            "Username already taken."
        };
        return Err(AppError::Conflict(detail.to_string()));
    }

    let password_hash = password::hash_password(&body.password)?;
    let now = Utc::now().fixed_offset();
    let user_id = Uuid::new_v4();

    let txn = state.db.begin().await?;

    let created = user::ActiveModel {
        id: Set(user_id),
        email: Set(email.clone()),
        username: Set(username),
        display_name: Set(None),
        avatar_url: Set(None),
        bio: Set(None),
        email_verified: Set(false),
        role: Set("user".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(&txn)
    .await?;

    auth_provider::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        provider: Set("email".to_string()),
        provider_id: Set(email.clone()),
        password_hash: Set(Some(password_hash)),
        provider_email: Set(Some(email)),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = %created.id, "account created");
    let token = jwt::generate_token(user_id, &created.role, &state.config)?;

    let response = AuthResponse {
        user: UserResponse::from(&created),
        token,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// `POST /api/v1/auth/signin/email`
///
/// All failure paths return the same Unauthorized message so the response
/// does not reveal which part of the credentials was wrong.
async fn signin_email(
    State(state): State<AppState>,
    Json(body): Json<SigninRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = body.email.trim().to_lowercase();
    let bad_credentials = || AppError::Unauthorized("Invalid email or password.".to_string());

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .filter(user::Column::DeletedAt.is_null())
        .one(&state.db)
        .await?
        .ok_or_else(bad_credentials)?;

    let credential = auth_provider::Entity::find()
        .filter(auth_provider::Column::UserId.eq(account.id))
        .filter(auth_provider::Column::Provider.eq("email"))
        .one(&state.db)
        .await?
        .ok_or_else(bad_credentials)?;

    let hash = credential
        .password_hash
        .as_deref()
        .ok_or_else(bad_credentials)?;
    if !password::verify_password(&body.password, hash)? {
        return Err(bad_credentials());
    }

    let token = jwt::generate_token(account.id, &account.role, &state.config)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&account),
        token,
    }))
}
