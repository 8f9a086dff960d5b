// Database models

pub mod auth;
pub mod login_history;
pub mod role;
pub mod social_account;
pub mod user;
pub mod user_role;

pub use auth::{AccessTokenClaims, RefreshTokenClaims};
pub use login_history::{LoginHistoryEntry, NewLoginHistoryEntry};
pub use role::{NewRole, Role, RoleChangeset, RoleError};
pub use social_account::{NewSocialAccount, SocialAccount};
pub use user::{NewUser, User, UserError, UserUpdate};
pub use user_role::UserRole;
