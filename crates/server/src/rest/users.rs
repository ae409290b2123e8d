use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AppError, CreateUserRequest, PaginatedResponse,
    UpdateUserRoleRequest, UserListParams, UserResponse, UserRole, USER_ROLES,
};

use super::{optional_filter, parse_role};
use crate::extract::{Json, Query};
use crate::auth::extractors::{AdminRequired, MaintenanceRequired};
use crate::auth::password;
use crate::error_convert::{internal_error, ValidateRequest};
use crate::repo::audit::{self, AuditEntry};

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListParams),
    responses(
        (status = 200, description = "Paginated users", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admin or maintenance role required", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_users(
    State(pool): State<Pool<Postgres>>,
    _auth: MaintenanceRequired,
    Query(params): Query<UserListParams>,
) -> Result<Json<PaginatedResponse<UserResponse>>, AppError> {
    let role = optional_filter("role", params.role.as_deref(), USER_ROLES)?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (users, total) = crate::repo::user::list(
        &pool,
        role,
        params.q.as_deref(),
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(users, page, limit, total).map(UserResponse::from),
    ))
}

/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Email already registered", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool, body), fields(email = %body.email, role = %body.role))]
pub async fn create_user(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    body.validate_request()?;
    let role = parse_role(&body.role)?;

    let email = super::auth::normalize_email(&body.email);
    let hash = password::hash_password(&body.password)
        .map_err(|e| internal_error("Failed to hash password", e))?;

    let user = crate::repo::user::create(
        &pool,
        &email,
        &hash,
        body.display_name.trim(),
        role.as_str(),
    )
    .await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "user.create", "user")
            .entity(user.id)
            .details(json!({ "role": role.as_str() })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool))]
pub async fn get_user(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = crate::repo::user::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;
    Ok(Json(UserResponse::from(user)))
}

/// PATCH /api/users/{id}/role
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Invalid role", body = AppError),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool))]
pub async fn update_user_role(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let role = parse_role(&body.role)?;

    let user = crate::repo::user::update_role(&pool, id, role.as_str())
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

    // Existing sessions pick up the new role on their next refresh.
    if role != UserRole::Admin {
        crate::repo::user::revoke_refresh_tokens(&pool, id).await?;
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "user.role_change", "user")
            .entity(id)
            .details(json!({ "role": role.as_str() })),
    )
    .await;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete own account", body = AppError),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "users"
)]
#[tracing::instrument(skip(pool))]
pub async fn delete_user(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if id == auth.0.sub {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    if !crate::repo::user::delete(&pool, id).await? {
        return Err(AppError::not_found(format!("User {} not found", id)));
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "user.delete", "user").entity(id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
