use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{NewUser, User};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

/// A real Argon2 hash generated once at startup, used as a timing decoy
/// so that login requests for non-existent users take the same time as
/// requests for existing users.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", Salt::from(&salt))
        .expect("failed to generate dummy hash")
        .to_string()
});

#[async_trait::async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, profile_image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, profile_image_url, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, USER_EMAIL_CONSTRAINT) {
                AppError::UserAlreadyExists
            } else {
                AppError::from(e)
            }
        })?;

        Ok(created)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, profile_image_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, profile_image_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation() && db_error.constraint() == Some(constraint))
}

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), Salt::from(&salt))
        .map_err(|e| AppError::password_hash("Failed to hash password", e))?;

    Ok(password_hash.to_string())
}

pub(crate) fn verify_password(user: &User, password: &str) -> Result<(), AppError> {
    let password_hash = PasswordHash::new(&user.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &password_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    Ok(())
}

/// Perform a throwaway Argon2 verification to equalize response timing
/// regardless of whether the target account exists.
pub(crate) fn dummy_verify(password: &str) {
    if let Ok(hash) = PasswordHash::new(&DUMMY_HASH) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_hash(password_hash: String) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Al".to_string(),
            email: "a@x.com".to_string(),
            password_hash,
            profile_image_url: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("secret1").expect("hashable");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&user_with_hash(hash), "secret1").is_ok());
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let hash = hash_password("secret1").expect("hashable");
        let result = verify_password(&user_with_hash(hash), "secret2");
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password("secret1").expect("hashable");
        let second = hash_password("secret1").expect("hashable");
        assert_ne!(first, second);
    }

    #[test]
    fn corrupt_stored_hash_is_a_server_error() {
        let result = verify_password(&user_with_hash("not-a-phc-string".to_string()), "secret1");
        assert!(matches!(result, Err(AppError::PasswordHash { .. })));
    }
}
