// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::DieselPool,
    services::{AuthService, JwtService, RateLimitService, RoleService},
    RedisPool,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub role_service: Arc<RoleService>,
    pub rate_limit_service: Arc<RateLimitService>,
    pub max_connections: u32,
}
