// Authentication service: login, register, refresh rotation, logout,
// logout-all-other, login history, profile updates.
//
// Session-state invariants owned here:
// - a refresh token is valid iff signature/expiry verify AND its jti is not
//   deny-listed AND its jti is in the owner's session index;
// - rotation deny-lists the consumed jti before the new pair becomes
//   visible to the caller (deny -> remove old -> add new).

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{LoginHistoryEntry, NewLoginHistoryEntry, NewUser, User, UserError, UserUpdate};
use crate::services::jwt::{JwtError, JwtService};
use crate::services::token_store::{TokenStore, TokenStoreError};
use crate::utils::password::{hash_password_with_cost, verify_password, PasswordError};

#[derive(thiserror::Error, Debug)]
pub enum AuthServiceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Token store error: {0}")]
    Store(#[from] TokenStoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Refresh token is not active")]
    RefreshNotActive,

    #[error("User not found")]
    UserNotFound,

    #[error("Login or email already taken")]
    Conflict(HashMap<String, String>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserError> for AuthServiceError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => AuthServiceError::UserNotFound,
            UserError::Database(e) => AuthServiceError::Database(e.to_string()),
        }
    }
}

impl From<JwtError> for AuthServiceError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthServiceError::TokenExpired,
            JwtError::TokenRevoked => AuthServiceError::TokenRevoked,
            JwtError::Store(e) => AuthServiceError::Store(e),
            JwtError::EncodingError(e) | JwtError::ClockError(e) => {
                AuthServiceError::Internal(e)
            }
            JwtError::TokenMalformed | JwtError::BadSignature => AuthServiceError::TokenInvalid,
        }
    }
}

/// An access/refresh pair as returned to clients
#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    db_pool: DieselPool,
    token_store: TokenStore,
    jwt_service: Arc<JwtService>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        db_pool: DieselPool,
        token_store: TokenStore,
        jwt_service: Arc<JwtService>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            db_pool,
            token_store,
            jwt_service,
            bcrypt_cost,
        }
    }

    async fn conn(
        &self,
    ) -> Result<
        bb8::PooledConnection<
            '_,
            diesel_async::pooled_connection::AsyncDieselConnectionManager<
                diesel_async::AsyncPgConnection,
            >,
        >,
        AuthServiceError,
    > {
        self.db_pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Pool(e.to_string()))
    }

    /// Register a new user. A single lookup covers login and (if given)
    /// email; on conflict nothing is written and a per-field error map is
    /// returned.
    pub async fn register(
        &self,
        login: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<User, AuthServiceError> {
        let mut conn = self.conn().await?;

        if let Some(existing) = User::find_by_login_or_email(&mut conn, login, email).await? {
            let mut errors = HashMap::new();
            if existing.login == login {
                warn!(login = %login, "Registration attempt with existing login");
                errors.insert(
                    "login".to_string(),
                    format!("User with login '{}' already exists.", login),
                );
            }
            if let (Some(email), Some(existing_email)) = (email, existing.email.as_deref()) {
                if existing_email == email {
                    warn!(email = %email, "Registration attempt with existing email");
                    errors.insert(
                        "email".to_string(),
                        format!("User with email '{}' already exists.", email),
                    );
                }
            }
            return Err(AuthServiceError::Conflict(errors));
        }

        let password_hash = hash_password_with_cost(password, self.bcrypt_cost)?;
        let user = User::create(
            &mut conn,
            NewUser {
                login: login.to_string(),
                password_hash,
                email: email.map(str::to_string),
                is_superuser: false,
            },
        )
        .await?;

        info!(user_id = %user.id, login = %user.login, "New user registered");
        Ok(user)
    }

    /// Authenticate and open a session. Returns None for both unknown login
    /// and wrong password so the caller cannot distinguish the two.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Option<TokenPair>, AuthServiceError> {
        let mut conn = self.conn().await?;

        let user = match User::find_by_login(&mut conn, login).await {
            Ok(user) => user,
            Err(UserError::NotFound) => {
                warn!(login = %login, "Failed login attempt");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &user.password_hash) {
            warn!(login = %login, "Failed login attempt");
            return Ok(None);
        }

        let access = self
            .jwt_service
            .issue_access(user.id, Some(&user.login), false)?;
        let refresh = self.jwt_service.issue_refresh(user.id)?;

        // The session-index write is authoritative; the audit row is not
        self.token_store
            .add_session_jti(user.id, &refresh.jti, self.jwt_service.refresh_token_expiry())
            .await?;

        let entry = NewLoginHistoryEntry::new(user.id, ip_address, user_agent);
        if let Err(e) = LoginHistoryEntry::insert(&mut conn, entry).await {
            warn!(user_id = %user.id, error = %e, "Failed to record login history");
        }

        info!(user_id = %user.id, login = %user.login, "User logged in");
        Ok(Some(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        }))
    }

    /// Rotate a refresh token: the consumed jti moves to the deny-list, the
    /// new jti is installed in the session index.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthServiceError> {
        let claims = self.jwt_service.decode_refresh(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthServiceError::TokenInvalid)?;

        if self.token_store.is_denied(&claims.jti).await? {
            warn!(jti = %claims.jti, "Refresh attempt with deny-listed token");
            return Err(AuthServiceError::TokenRevoked);
        }

        if !self.token_store.is_active_session(user_id, &claims.jti).await? {
            warn!(user_id = %user_id, jti = %claims.jti, "Refresh attempt with inactive token");
            return Err(AuthServiceError::RefreshNotActive);
        }

        // Carry the login claim forward so access tokens stay self-describing
        let login = {
            let mut conn = self.conn().await?;
            User::find_by_id(&mut conn, user_id).await?.login
        };

        let access = self.jwt_service.issue_access(user_id, Some(&login), false)?;
        let refresh = self.jwt_service.issue_refresh(user_id)?;

        // Ordering matters under concurrent refreshes of the same token:
        // deny-list first so the loser of the race observes the revocation,
        // then swap the index membership
        let now = self.jwt_service.now().map_err(AuthServiceError::from)?;
        self.token_store
            .deny(&claims.jti, claims.remaining_ttl(now))
            .await?;
        self.token_store.remove_session_jti(user_id, &claims.jti).await?;
        self.token_store
            .add_session_jti(user_id, &refresh.jti, self.jwt_service.refresh_token_expiry())
            .await?;

        info!(user_id = %user_id, "Tokens rotated");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Revoke one session. An expired refresh token still has its jti
    /// deny-listed for the minimum interval.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthServiceError> {
        let claims = self.jwt_service.decode_refresh_allow_expired(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthServiceError::TokenInvalid)?;

        let now = self.jwt_service.now().map_err(AuthServiceError::from)?;
        self.token_store
            .deny(&claims.jti, claims.remaining_ttl(now))
            .await?;
        self.token_store.remove_session_jti(user_id, &claims.jti).await?;

        info!(user_id = %user_id, jti = %claims.jti, "User logged out");
        Ok(())
    }

    /// Revoke every session except the one presenting `current_refresh_token`
    pub async fn logout_all_other_sessions(
        &self,
        user_id: Uuid,
        current_refresh_token: &str,
    ) -> Result<(), AuthServiceError> {
        let current = self.jwt_service.decode_refresh(current_refresh_token)?;
        let refresh_ttl = self.jwt_service.refresh_token_expiry();

        let active_jtis = self.token_store.session_jtis(user_id).await?;
        for jti in active_jtis.iter().filter(|jti| **jti != current.jti) {
            self.token_store.deny(jti, refresh_ttl).await?;
            info!(user_id = %user_id, jti = %jti, "Session revoked (logout all other)");
        }

        self.token_store
            .replace_sessions(user_id, &current.jti, refresh_ttl)
            .await?;

        info!(user_id = %user_id, current_jti = %current.jti, "All other sessions closed");
        Ok(())
    }

    /// Login history, newest first. Limits are validated at the edge.
    pub async fn get_login_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LoginHistoryEntry>, AuthServiceError> {
        let mut conn = self.conn().await?;
        let history = LoginHistoryEntry::recent_for_user(&mut conn, user_id, limit, offset).await?;
        Ok(history)
    }

    /// Update login/password/email. A login change re-checks uniqueness.
    /// Existing sessions stay valid.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        login: Option<&str>,
        password: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AuthServiceError> {
        let mut conn = self.conn().await?;

        let user = User::find_by_id(&mut conn, user_id).await?;

        let mut update = UserUpdate::default();

        if let Some(new_login) = login {
            if new_login != user.login {
                match User::find_by_login(&mut conn, new_login).await {
                    Ok(_) => {
                        warn!(user_id = %user_id, new_login = %new_login, "Login change to taken login");
                        let mut errors = HashMap::new();
                        errors.insert(
                            "login".to_string(),
                            format!("Login '{}' is already taken.", new_login),
                        );
                        return Err(AuthServiceError::Conflict(errors));
                    }
                    Err(UserError::NotFound) => {}
                    Err(e) => return Err(e.into()),
                }
                update.login = Some(new_login.to_string());
            }
        }

        if let Some(password) = password {
            update.password_hash = Some(hash_password_with_cost(password, self.bcrypt_cost)?);
        }

        if let Some(email) = email {
            update.email = Some(email.to_string());
        }

        let user = User::update(&mut conn, user_id, update).await?;
        info!(user_id = %user_id, "Profile updated");
        Ok(user)
    }
}
