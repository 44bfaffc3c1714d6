use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AdminUser;
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Roles assignable through the admin API.
const ASSIGNABLE_ROLES: &[&str] = &["user", "admin"];

/// Build the admin route group: `/admin/...` (admin role required).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/role", patch(update_role))
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    offset: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

const fn default_limit() -> u64 {
    50
}

#[derive(Deserialize)]
struct UpdateRoleRequest {
    role: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminUserResponse {
    id: Uuid,
    email: String,
    username: String,
    role: String,
    email_verified: bool,
    created_at: String,
}

#[derive(Serialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
    total: u64,
    offset: u64,
    limit: u64,
}

/// `GET /admin/users` — List accounts for role management.
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let total = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .count(&state.db)
        .await?;

    let users = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .order_by_desc(user::Column::CreatedAt)
        .offset(pagination.offset)
        .limit(pagination.limit)
        .all(&state.db)
        .await?;

    Ok(Json(PaginatedResponse {
        data: users.into_iter().map(to_admin_user).collect::<Vec<_>>(),
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }))
}

/// `PATCH /admin/users/:id/role` — Change an account's role.
async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !ASSIGNABLE_ROLES.contains(&body.role.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown role: {}",
            body.role
        )));
    }

    // Admins cannot demote themselves; another admin has to do it.
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot change your own role.".to_string(),
        ));
    }

    let target = user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = target.into();
    active.role = Set(body.role);
    active.updated_at = Set(Utc::now().fixed_offset());
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = %updated.id, role = %updated.role, "role updated");
    Ok(Json(to_admin_user(updated)))
}

fn to_admin_user(user_model: user::Model) -> AdminUserResponse {
    AdminUserResponse {
        id: user_model.id,
        email: user_model.email,
        username: user_model.username,
        role: user_model.role,
        email_verified: user_model.email_verified,
        created_at: user_model.created_at.to_string(),
    }
}
