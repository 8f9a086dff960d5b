// HTTP surface: route builders and cross-handler helpers

pub mod auth;
pub mod roles;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::collections::HashMap;
use tracing::error;
use validator::ValidationErrors;

use crate::app::AppState;
use crate::utils::auth_errors::ApiError;

/// Public authentication routes (no principal required)
pub fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
}

/// Authentication routes that require a validated principal
pub fn auth_session_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/logout_all_other_sessions",
            post(auth::logout_all_other_sessions),
        )
        .route("/history", get(auth::get_login_history))
        .route("/profile", axum::routing::put(auth::update_profile))
}

/// Role management routes (all behind the auth middleware)
pub fn role_routes() -> Router<AppState> {
    // The leading segment is a role id for CRUD/bindings and a user id for
    // the permissions lookup; the router needs one shared parameter name
    Router::new()
        .route("/", post(roles::create_role).get(roles::list_roles))
        .route(
            "/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/{id}/assign/{user_id}", post(roles::assign_role_to_user))
        .route(
            "/{id}/revoke/{user_id}",
            delete(roles::revoke_role_from_user),
        )
        .route("/{id}/permissions", get(roles::get_user_permissions))
}

/// Admission check shared by every handler. Denied requests surface as 429;
/// a failing limiter backend fails closed.
pub async fn enforce_rate_limit(
    state: &AppState,
    traffic_class: &str,
    identifier: &str,
    roles: &[String],
) -> Result<(), ApiError> {
    match state
        .rate_limit_service
        .allow_request(identifier, roles, traffic_class)
        .await
    {
        Ok(decision) if decision.allowed => Ok(()),
        Ok(_) => Err(ApiError::RateLimited),
        Err(e) => {
            error!("Rate limit check failed, denying request: {}", e);
            Err(ApiError::BackendUnavailable)
        }
    }
}

/// Flatten validator output into the {field: message} envelope shape
pub fn validation_error_map(errors: ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let message = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| "Invalid value".to_string());
            (field.to_string(), message)
        })
        .collect()
}
