use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MIN_NAME_LENGTH: usize = 2;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row ready to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: String,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Deserialize, Debug, JsonSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image_url: user.profile_image_url.clone(),
            created_at: user.created_at,
        }
    }
}

/// Emails are matched case-insensitively and ignoring surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() >= MIN_NAME_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::new("name_too_short").with_message("Name must be at least 2 characters long".into()))
    }
}

pub fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(&normalize_email(email)) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message("Please enter a valid email address".into()))
    }
}
