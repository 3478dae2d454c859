use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldErrors};

/// Credentials submitted to register or log in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct Credentials {
    /// Username (1-32 chars, letters, digits and underscores).
    #[schema(example = "shop_admin")]
    pub username: String,
    /// Password (8-128 bytes).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_registration(payload: &Credentials) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();

    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        errors.add("username", "Username must be 1-32 characters");
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.add(
            "username",
            "Username must contain only letters, digits, and underscores",
        );
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        errors.add("password", "Password must be 8-128 characters");
    }

    errors.into_result()
}

pub fn validate_login(payload: &Credentials) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if payload.username.trim().is_empty() {
        errors.add("username", "Username must not be empty");
    }
    if payload.password.is_empty() {
        errors.add("password", "Password must not be empty");
    }
    errors.into_result()
}

/// Public view of a user account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "shop_admin")]
    pub username: String,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// Token lifetime in seconds.
    #[schema(example = 604800)]
    pub expires_in: i64,
    pub user: UserResponse,
}
