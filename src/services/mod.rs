// Business logic layer

pub mod auth;
pub mod jwt;
pub mod rate_limit;
pub mod roles;
pub mod token_store;

pub use auth::{AuthService, AuthServiceError, TokenPair};
pub use jwt::{IssuedToken, JwtConfig, JwtError, JwtService};
pub use rate_limit::{RateLimitDecision, RateLimitError, RateLimitService};
pub use roles::{RoleService, RoleServiceError};
pub use token_store::{TokenStore, TokenStoreError};
