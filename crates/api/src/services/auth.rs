//! Account registration and password login.

use std::sync::Arc;

use domain::models::User;
use persistence::repositories::UserRepository;
use shared::jwt::{IssuedToken, JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LENGTH};
use thiserror::Error;

use crate::config::JwtAuthConfig;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Password does not meet requirements")]
    WeakPassword(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub token: IssuedToken,
}

/// Builds the token signer from configured PEM keys.
pub fn jwt_config_from(config: &JwtAuthConfig) -> Result<JwtConfig, JwtError> {
    JwtConfig::new(
        &normalize_pem_key(&config.private_key),
        &normalize_pem_key(&config.public_key),
        config.access_token_expiry_secs,
        config.leeway_secs,
    )
}

/// Turns a PEM key passed through an env var back into a multi-line PEM.
///
/// Env files often carry the key on one line with literal `\n` escapes and
/// sometimes keep the surrounding quotes.
pub fn normalize_pem_key(key: &str) -> String {
    let key = key.trim().trim_matches('"').trim_matches('\'');
    let normalized = key.replace("\\n", "\n");

    if !normalized.contains('\n') && normalized.len() > 100 {
        tracing::error!("PEM key has no line breaks after normalization");
    }

    normalized
}

/// Registers accounts and logs users in.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(users: UserRepository, jwt: Arc<JwtConfig>) -> Self {
        Self { users, jwt }
    }

    /// Register a new user with email and password.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthResult, AuthError> {
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = match self.users.create(email, &password_hash, display_name).await {
            Ok(user) => user,
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                return Err(AuthError::EmailAlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.jwt.issue_access_token(user.id, &user.email)?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthResult { user, token })
    }

    /// Login with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt.issue_access_token(user.id, &user.email)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthResult { user, token })
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
