use crate::auth::{decode_token, issue_token};
use crate::config::AuthConfig;
use crate::database::user::{UserRepository, dummy_verify, hash_password, verify_password};
use crate::error::app_error::AppError;
use crate::models::user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User, UserResponse, normalize_email};
use uuid::Uuid;
use validator::Validate;

pub struct AuthService<'a, R: UserRepository> {
    repository: &'a R,
    config: &'a AuthConfig,
}

impl<'a, R: UserRepository + Sync> AuthService<'a, R> {
    pub fn new(repository: &'a R, config: &'a AuthConfig) -> Self {
        AuthService { repository, config }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.repository.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let new_user = NewUser {
            name: request.name.trim().to_string(),
            email,
            password_hash: hash_password(&request.password)?,
            profile_image_url: request.profile_image_url.as_deref().map(str::trim).unwrap_or_default().to_string(),
        };

        // The unique index still guards against a concurrent registration slipping past the check above.
        let user = self.repository.create_user(&new_user).await?;
        tracing::info!(user_id = %user.id, "user registered");

        self.auth_response(&user)
    }

    /// Unknown emails and wrong passwords produce the same error.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AppError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::BadRequest("Email and password are required".to_string()));
        }

        let email = normalize_email(&request.email);
        let Some(user) = self.repository.get_user_by_email(&email).await? else {
            dummy_verify(&request.password);
            return Err(AppError::InvalidCredentials);
        };

        verify_password(&user, &request.password)?;

        self.auth_response(&user)
    }

    pub async fn verify_token(&self, token: &str) -> Result<User, AppError> {
        let user_id = decode_token(token, self.config)?;
        self.repository.get_user_by_id(&user_id).await?.ok_or(AppError::InvalidToken)
    }

    pub async fn get_profile(&self, user_id: &Uuid) -> Result<UserResponse, AppError> {
        let user = self.repository.get_user_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;
        Ok(UserResponse::from(&user))
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            user: UserResponse::from(user),
            token: issue_token(&user.id, self.config)?,
        })
    }
}
