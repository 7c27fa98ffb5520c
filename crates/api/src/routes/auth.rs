//! Authentication routes for registration and login.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::auth::{AuthError, AuthResult};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: Option<String>,
}

/// Request body for password login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response body for a successful registration or login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user,
            access_token: result.token.token,
            token_type: "Bearer".to_string(),
            expires_in: result.token.expires_in,
        }
    }
}

fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::EmailAlreadyExists => ApiError::Conflict("Email already registered".to_string()),
        AuthError::WeakPassword(msg) => ApiError::Validation(msg),
        AuthError::InvalidCredentials => {
            ApiError::Unauthorized("Invalid email or password".to_string())
        }
        AuthError::DatabaseError(db_err) => ApiError::from(db_err),
        AuthError::PasswordError(e) => ApiError::Internal(format!("Password error: {}", e)),
        AuthError::TokenError(e) => ApiError::Internal(format!("Token error: {}", e)),
    }
}

/// Register a new user with email and password.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let result = state
        .auth
        .register(
            &request.email,
            &request.password,
            request.display_name.as_deref(),
        )
        .await
        .map_err(map_auth_error)?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// Login with email and password.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let result = state
        .auth
        .login(&request.email, &request.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::jwt::IssuedToken;
    use uuid::Uuid;

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            email: "test@example.com".to_string(),
            password: "correct horse".to_string(),
            display_name: Some("Test User".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_invalid_email() {
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "correct horse".to_string(),
            display_name: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_register_request_display_name_optional() {
        let json = r#"{"email": "a@example.com", "password": "12345678"}"#;
        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert!(request.display_name.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_request_empty_password() {
        let request = LoginRequest {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_auth_response_shape() {
        let result = AuthResult {
            user: User {
                id: Uuid::new_v4(),
                email: "a@example.com".to_string(),
                password_hash: "$argon2id$hash".to_string(),
                display_name: None,
                created_at: Utc::now(),
            },
            token: IssuedToken {
                token: "header.payload.sig".to_string(),
                jti: "jti".to_string(),
                expires_in: 3600,
            },
        };

        let json = serde_json::to_value(AuthResponse::from(result)).unwrap();
        assert_eq!(json["accessToken"], "header.payload.sig");
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["expiresIn"], 3600);
        assert_eq!(json["user"]["email"], "a@example.com");
        assert!(json["user"].get("passwordHash").is_none());
    }

    #[test]
    fn test_map_auth_error() {
        assert!(matches!(
            map_auth_error(AuthError::EmailAlreadyExists),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            map_auth_error(AuthError::InvalidCredentials),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            map_auth_error(AuthError::WeakPassword("short".into())),
            ApiError::Validation(_)
        ));
    }
}
