// Authentication endpoints: register, login, refresh, logout,
// logout-all-other-sessions, login history

use axum::{
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::{headers::UserAgent, TypedHeader};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    handlers::{enforce_rate_limit, validation_error_map},
    middleware::auth::CurrentUser,
    models::LoginHistoryEntry,
    services::auth::AuthServiceError,
    services::TokenPair,
    utils::auth_errors::ApiError,
    utils::{trim_and_validate_field, trim_optional_field},
};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Login must be between 1 and 50 characters"))]
    pub login: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Email must be less than 100 characters"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Login must be between 1 and 50 characters"))]
    pub login: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Login must be between 1 and 50 characters"))]
    pub login: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 100, message = "Email must be less than 100 characters"))]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub login: String,
    pub email: Option<String>,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginHistoryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub login_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<LoginHistoryEntry> for LoginHistoryResponse {
    fn from(entry: LoginHistoryEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            login_at: entry.login_at,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
        }
    }
}

/// Map auth-service failures onto the wire. Neutral 401s for credential and
/// token failures; fast-KV outages fail closed.
fn map_auth_error(e: AuthServiceError) -> ApiError {
    match e {
        AuthServiceError::Conflict(fields) => ApiError::Conflict(fields),
        AuthServiceError::TokenRevoked => ApiError::token("Refresh token is blacklisted"),
        AuthServiceError::RefreshNotActive => ApiError::token("Refresh token is not active"),
        AuthServiceError::TokenExpired
        | AuthServiceError::TokenInvalid
        | AuthServiceError::UserNotFound => ApiError::token("Invalid or expired refresh token"),
        AuthServiceError::Store(e) => {
            tracing::error!("Token store failure: {}", e);
            ApiError::BackendUnavailable
        }
        AuthServiceError::Pool(e) => {
            tracing::error!("Connection pool failure: {}", e);
            ApiError::BackendUnavailable
        }
        AuthServiceError::Database(e) => {
            tracing::error!("Database failure: {}", e);
            ApiError::Internal
        }
        AuthServiceError::Password(e) => {
            tracing::error!("Password hashing failure: {}", e);
            ApiError::Internal
        }
        AuthServiceError::Internal(e) => {
            tracing::error!("Internal failure: {}", e);
            ApiError::Internal
        }
    }
}

const GUEST_ROLES: &[&str] = &["guest"];

fn guest_roles() -> Vec<String> {
    GUEST_ROLES.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /auth/register - Create a new user account
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    enforce_rate_limit(&state, "register", &addr.ip().to_string(), &guest_roles()).await?;

    request
        .validate()
        .map_err(|e| ApiError::Validation(validation_error_map(e)))?;

    let login = trim_and_validate_field(&request.login, true).map_err(|_| {
        let mut errors = std::collections::HashMap::new();
        errors.insert("login".to_string(), "Login cannot be empty".to_string());
        ApiError::Validation(errors)
    })?;
    let email = trim_optional_field(request.email.as_ref());

    state
        .auth_service
        .register(&login, &request.password, email.as_deref())
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::CREATED)
}

/// POST /auth/login - Authenticate and issue a token pair
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let ip_address = addr.ip().to_string();
    enforce_rate_limit(&state, "login", &ip_address, &guest_roles()).await?;

    request
        .validate()
        .map_err(|e| ApiError::Validation(validation_error_map(e)))?;

    let user_agent = user_agent.map(|TypedHeader(ua)| ua.to_string());

    let tokens = state
        .auth_service
        .login(&request.login, &request.password, Some(ip_address), user_agent)
        .await
        .map_err(map_auth_error)?;

    match tokens {
        Some(pair) => Ok(Json(pair)),
        None => Err(ApiError::BadCredentials),
    }
}

/// POST /auth/refresh - Rotate a refresh token into a new pair
pub async fn refresh_token(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    enforce_rate_limit(&state, "default", &addr.ip().to_string(), &guest_roles()).await?;

    let pair = state
        .auth_service
        .refresh_tokens(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(pair))
}

/// POST /auth/logout - Revoke one session
pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    enforce_rate_limit(&state, "default", &addr.ip().to_string(), &guest_roles()).await?;

    state
        .auth_service
        .logout(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// POST /auth/logout_all_other_sessions - Revoke every session but this one
pub async fn logout_all_other_sessions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    enforce_rate_limit(
        &state,
        "default",
        &current_user.id.to_string(),
        &current_user.roles,
    )
    .await?;

    state
        .auth_service
        .logout_all_other_sessions(current_user.id, &request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(MessageResponse {
        message: "Logged out from all other sessions successfully".to_string(),
    }))
}

/// PUT /auth/profile - Update login, password, or email.
/// Existing sessions remain valid after the change.
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    enforce_rate_limit(
        &state,
        "default",
        &current_user.id.to_string(),
        &current_user.roles,
    )
    .await?;

    request
        .validate()
        .map_err(|e| ApiError::Validation(validation_error_map(e)))?;

    let user = state
        .auth_service
        .update_profile(
            current_user.id,
            request.login.as_deref(),
            request.password.as_deref(),
            request.email.as_deref(),
        )
        .await
        .map_err(map_auth_error)?;

    Ok(Json(UserResponse {
        id: user.id,
        login: user.login,
        email: user.email,
        is_superuser: user.is_superuser,
        created_at: user.created_at,
    }))
}

/// GET /auth/history - Login history for the current user, newest first
pub async fn get_login_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    enforce_rate_limit(
        &state,
        "default",
        &current_user.id.to_string(),
        &current_user.roles,
    )
    .await?;

    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);
    if !(1..=1000).contains(&limit) || offset < 0 {
        let mut errors = std::collections::HashMap::new();
        errors.insert(
            "query".to_string(),
            "limit must be in [1, 1000] and offset must be non-negative".to_string(),
        );
        return Err(ApiError::Validation(errors));
    }

    let history = state
        .auth_service
        .get_login_history(current_user.id, limit, offset)
        .await
        .map_err(map_auth_error)?;

    let response: Vec<LoginHistoryResponse> =
        history.into_iter().map(LoginHistoryResponse::from).collect();
    Ok(Json(response))
}
