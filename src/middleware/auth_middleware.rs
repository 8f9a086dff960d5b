// Authentication middleware for protected routes
// Validates the bearer access token and injects CurrentUser into extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::CurrentUser,
    models::{User, UserError},
    services::jwt::JwtError,
    utils::auth_errors::ApiError,
};

/// Validate the Authorization header and materialize the caller principal.
/// Rejects with 401 on any decode failure, a deny-listed jti, or an absent
/// user row; fast-KV failures reject as well (authentication fails closed).
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return ApiError::MissingToken.into_response(),
    };

    let claims = match state.jwt_service.decode_access(token).await {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Access token validation failed: {}", e);
            let error = match e {
                JwtError::TokenExpired => ApiError::token("Token has expired"),
                JwtError::TokenRevoked => ApiError::token("Token is blacklisted"),
                JwtError::Store(_) => ApiError::BackendUnavailable,
                _ => ApiError::token("Invalid token"),
            };
            return error.into_response();
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid token: bad user ID format");
            return ApiError::token("Invalid token: invalid user ID format").into_response();
        }
    };

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Failed to get database connection: {}", e);
            return ApiError::BackendUnavailable.into_response();
        }
    };

    let user = match User::find_by_id(&mut conn, user_id).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            tracing::warn!(user_id = %user_id, "Token subject not found");
            return ApiError::token("User not found").into_response();
        }
        Err(e) => {
            tracing::error!("Database error during authentication: {}", e);
            return ApiError::Internal.into_response();
        }
    };
    drop(conn);

    let permissions = match state.role_service.cached_permissions(&user).await {
        Ok(permissions) => permissions,
        Err(e) => {
            tracing::error!(user_id = %user_id, "Permission resolution failed: {}", e);
            return ApiError::Internal.into_response();
        }
    };

    let roles = match state.role_service.get_user_roles(&user).await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::error!(user_id = %user_id, "Role resolution failed: {}", e);
            return ApiError::Internal.into_response();
        }
    };

    let principal = CurrentUser {
        id: user.id,
        login: claims.login.unwrap_or(user.login),
        mfa_verified: claims.mfa_verified,
        is_superuser: user.is_superuser,
        permissions,
        roles,
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Extractor for CurrentUser from request extensions
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::MissingToken)
    }
}
