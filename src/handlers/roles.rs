// Role management endpoints: CRUD, user-role bindings, effective permissions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    handlers::{enforce_rate_limit, validation_error_map},
    middleware::auth::CurrentUser,
    models::{NewRole, Role, RoleChangeset, User, UserError},
    services::roles::RoleServiceError,
    utils::auth_errors::ApiError,
};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RoleCreateRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Description must be less than 255 characters"))]
    pub description: Option<String>,

    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RoleUpdateRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "Description must be less than 255 characters"))]
    pub description: Option<String>,

    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            permissions: role.permissions,
            created_at: role.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserPermissionsResponse {
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

fn map_role_error(e: RoleServiceError) -> ApiError {
    match e {
        RoleServiceError::NameTaken(name) => {
            let mut fields = std::collections::HashMap::new();
            fields.insert(
                "name".to_string(),
                format!("Role with name '{}' already exists.", name),
            );
            ApiError::Conflict(fields)
        }
        RoleServiceError::RoleNotFound => ApiError::not_found("role", "Role not found"),
        RoleServiceError::UserNotFound => ApiError::not_found("user", "User not found"),
        RoleServiceError::AssignmentRejected => ApiError::bad_request(
            "binding",
            "User or Role not found, or role already assigned",
        ),
        RoleServiceError::BindingNotFound => {
            ApiError::bad_request("binding", "User-Role assignment not found")
        }
        RoleServiceError::Store(e) => {
            tracing::error!("Token store failure: {}", e);
            ApiError::BackendUnavailable
        }
        RoleServiceError::Pool(e) => {
            tracing::error!("Connection pool failure: {}", e);
            ApiError::BackendUnavailable
        }
        RoleServiceError::Database(e) => {
            tracing::error!("Database failure: {}", e);
            ApiError::Internal
        }
    }
}

async fn guard(state: &AppState, user: &CurrentUser, permission: &str) -> Result<(), ApiError> {
    enforce_rate_limit(state, "default", &user.id.to_string(), &user.roles).await?;
    user.require_permission(permission)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /roles/ - Create a role
pub async fn create_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<RoleCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    guard(&state, &current_user, "manage_roles").await?;

    request
        .validate()
        .map_err(|e| ApiError::Validation(validation_error_map(e)))?;

    let role = state
        .role_service
        .create_role(NewRole {
            name: request.name,
            description: request.description,
            permissions: request.permissions,
        })
        .await
        .map_err(map_role_error)?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

/// GET /roles/ - List all roles
pub async fn list_roles(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    enforce_rate_limit(&state, "default", &current_user.id.to_string(), &current_user.roles)
        .await?;

    let roles = state
        .role_service
        .get_all_roles()
        .await
        .map_err(map_role_error)?;

    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// GET /roles/{role_id} - Fetch one role
pub async fn get_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(role_id): Path<Uuid>,
) -> Result<Json<RoleResponse>, ApiError> {
    enforce_rate_limit(&state, "default", &current_user.id.to_string(), &current_user.roles)
        .await?;

    let role = state
        .role_service
        .get_role_by_id(role_id)
        .await
        .map_err(map_role_error)?;

    Ok(Json(RoleResponse::from(role)))
}

/// PUT /roles/{role_id} - Partial update
pub async fn update_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(role_id): Path<Uuid>,
    Json(request): Json<RoleUpdateRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    guard(&state, &current_user, "manage_roles").await?;

    request
        .validate()
        .map_err(|e| ApiError::Validation(validation_error_map(e)))?;

    let role = state
        .role_service
        .update_role(
            role_id,
            RoleChangeset {
                name: request.name,
                description: request.description,
                permissions: request.permissions,
            },
        )
        .await
        .map_err(map_role_error)?;

    Ok(Json(RoleResponse::from(role)))
}

/// DELETE /roles/{role_id}
pub async fn delete_role(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(role_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    guard(&state, &current_user, "manage_roles").await?;

    let deleted = state
        .role_service
        .delete_role(role_id)
        .await
        .map_err(map_role_error)?;

    if !deleted {
        return Err(ApiError::not_found("role", "Role not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /roles/{role_id}/assign/{user_id}
pub async fn assign_role_to_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((role_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    guard(&state, &current_user, "manage_roles").await?;

    state
        .role_service
        .assign_role_to_user(user_id, role_id)
        .await
        .map_err(map_role_error)?;

    Ok(Json(MessageResponse {
        message: "Role assigned successfully".to_string(),
    }))
}

/// DELETE /roles/{role_id}/revoke/{user_id}
pub async fn revoke_role_from_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((role_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    guard(&state, &current_user, "manage_roles").await?;

    state
        .role_service
        .revoke_role_from_user(user_id, role_id)
        .await
        .map_err(map_role_error)?;

    Ok(Json(MessageResponse {
        message: "Role revoked successfully".to_string(),
    }))
}

/// GET /roles/{user_id}/permissions - Effective permission set (direct query)
pub async fn get_user_permissions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserPermissionsResponse>, ApiError> {
    guard(&state, &current_user, "manage_roles").await?;

    // 404 for unknown users, not an empty permission list
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::BackendUnavailable)?;
    let user = match User::find_by_id(&mut conn, user_id).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            return Err(ApiError::not_found("user", "User not found"));
        }
        Err(e) => {
            tracing::error!("Database failure: {}", e);
            return Err(ApiError::Internal);
        }
    };
    drop(conn);

    // Cached resolution: superusers short-circuit to the wildcard and an
    // empty set reads as the view_content default
    let permissions = state
        .role_service
        .cached_permissions(&user)
        .await
        .map_err(map_role_error)?;

    Ok(Json(UserPermissionsResponse {
        user_id,
        permissions,
    }))
}
