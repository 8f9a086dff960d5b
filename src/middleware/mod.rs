// Middleware modules

pub mod auth;
pub mod auth_middleware;

pub use auth::CurrentUser;
pub use auth_middleware::auth_middleware;
