// Library exports for the auth service core

pub mod app;
pub mod app_config;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use config::{BucketConfig, RateLimitMatrix, RoleBasedLimits};
pub use db::{DieselPool, RedisConfig, RedisPool};
pub use middleware::{auth_middleware, CurrentUser};
pub use models::auth::{AccessTokenClaims, RefreshTokenClaims};
pub use services::{
    AuthService, AuthServiceError, IssuedToken, JwtConfig, JwtError, JwtService,
    RateLimitDecision, RateLimitError, RateLimitService, RoleService, RoleServiceError,
    TokenPair, TokenStore, TokenStoreError,
};
pub use utils::{hash_password, verify_password, ApiError};

use std::sync::Arc;
use tracing::info;

/// Initialize pools, run migrations, and wire the service graph.
/// Shared by the binary and embedding consumers.
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = app_config::config();

    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::default();
        migrations::run_all_migrations(&diesel_pool, migration_config)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    info!("Initializing Redis pool...");
    let redis_config = RedisConfig::from_env();
    let redis_pool = RedisPool::new(redis_config).await?;

    let token_store = TokenStore::new(redis_pool.clone());

    let jwt_service = Arc::new(JwtService::new_with_store(
        JwtConfig::from_env(),
        token_store.clone(),
    ));

    let rate_limit_matrix = RateLimitMatrix::from_env();
    rate_limit_matrix
        .validate()
        .map_err(|e| format!("Rate limit configuration invalid: {}", e))?;
    let rate_limit_service = Arc::new(RateLimitService::new(
        redis_pool.clone(),
        rate_limit_matrix,
    ));

    let auth_service = Arc::new(AuthService::new(
        diesel_pool.clone(),
        token_store.clone(),
        jwt_service.clone(),
        config.security.bcrypt_cost,
    ));

    let role_service = Arc::new(RoleService::new(
        diesel_pool.clone(),
        token_store,
        config.security.permission_cache_ttl,
    ));

    Ok(AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        redis_pool,
        jwt_service,
        auth_service,
        role_service,
        rate_limit_service,
        max_connections,
    })
}

/// GET /health - liveness with per-component status
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let mut overall_healthy = true;
    let timestamp = chrono::Utc::now().to_rfc3339();

    let postgres_health = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(_) => serde_json::json!({
            "status": "healthy",
            "max_connections": state.max_connections,
            "error": null
        }),
        Err(e) => {
            overall_healthy = false;
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            })
        }
    };

    let redis_health_result = state.redis_pool.health_check().await;
    if !redis_health_result.is_healthy {
        overall_healthy = false;
    }

    let response = serde_json::json!({
        "status": if overall_healthy { "ok" } else { "degraded" },
        "service": "kino-auth-core",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health,
            "redis": serde_json::json!({
                "status": if redis_health_result.is_healthy { "healthy" } else { "unhealthy" },
                "latency_ms": redis_health_result.latency_ms,
                "error": redis_health_result.error
            })
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
