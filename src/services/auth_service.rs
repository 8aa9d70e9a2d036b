use sea_orm::{ DatabaseConnection, SqlErr };
use serde::Serialize;

use crate::crypto::{ hash_password, verify_password, TokenSigner };
use crate::db::{ entity::user, UserRepository };
use crate::error::{ AppError, Result };

pub const ADMIN_USER_ID: i32 = 1;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 80;
const EMAIL_MIN: usize = 3;
const EMAIL_MAX: usize = 120;
const PASSWORD_MIN: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub is_admin: bool,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
            is_admin: user.id == ADMIN_USER_ID,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub user: UserProfile,
}

pub struct AuthService {
    users: UserRepository,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, signer: TokenSigner) -> Self {
        Self {
            users: UserRepository::new(db),
            signer,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str
    ) -> Result<UserProfile> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        validate_username(username)?;
        validate_email(&email)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(
                AppError::validation(
                    "password",
                    format!("Password must be at least {} characters", PASSWORD_MIN)
                )
            );
        }

        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::conflict("username", "Username already taken"));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("email", "Email already registered"));
        }

        let password_hash = hash_password(password)?;
        let user = self.users
            .create(username.to_string(), email, password_hash).await
            .map_err(|e| {
                match e {
                    // Lost a race with a concurrent signup
                    AppError::Database(ref db_err) if
                        matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
                    => AppError::conflict("username", "Username or email already registered"),
                    other => other,
                }
            })?;

        tracing::info!("Registered user {} ({})", user.id, user.username);
        Ok(user.into())
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let email = email.trim().to_lowercase();
        let user = self.users.find_by_email(&email).await?.ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!("Failed login for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        let token = self.signer.issue(user.id)?;
        Ok(LoginResponse {
            token,
            token_type: "Bearer",
            user: user.into(),
        })
    }

    /// Resolve a bearer token to its user.
    pub async fn verify(&self, token: &str) -> Result<user::Model> {
        let claims = self.signer.verify(token)?;
        let user_id = claims.user_id()?;

        match self.users.find_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(AppError::NotFound(_)) => Err(AppError::InvalidToken),
            Err(e) => Err(e),
        }
    }
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(
            AppError::validation(
                "username",
                format!("Username must be between {} and {} characters", USERNAME_MIN, USERNAME_MAX)
            )
        );
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let len = email.chars().count();
    if !(EMAIL_MIN..=EMAIL_MAX).contains(&len) {
        return Err(
            AppError::validation(
                "email",
                format!("Email must be between {} and {} characters", EMAIL_MIN, EMAIL_MAX)
            )
        );
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() &&
                !domain.contains('@') &&
                domain.contains('.') &&
                !domain.starts_with('.') &&
                !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("email", "Invalid email address"));
    }
    Ok(())
}
