use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_helpers::{AppError, AuthUser, IdentityResolver, JwtAuth, TokenPurpose};
use email::NotificationService;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::directory::UserDirectory;
use crate::error::{UserError, UserResult};
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateProfile, User, UserResponse, UserSummary,
    normalize_email,
};
use crate::repository::UserRepository;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Service layer for accounts, credentials and tokens
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    jwt: JwtAuth,
    notifications: Option<NotificationService>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, jwt: JwtAuth) -> Self {
        Self {
            repository: Arc::new(repository),
            jwt,
            notifications: None,
        }
    }

    /// Send verification and reset emails through `notifications`.
    /// Without it the tokens are still issued but nothing is mailed.
    pub fn with_notifications(mut self, notifications: NotificationService) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Create an unverified account and mail the verification link
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<UserResponse> {
        validate_password(&input.password)?;

        let email = normalize_email(&input.email);
        if self.repository.get_by_email(&email).await?.is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .repository
            .create(User::new(input.name.trim().to_string(), email, password_hash))
            .await?;

        let token = self.issue(user.id, TokenPurpose::EmailVerification)?;
        if let Some(notifications) = &self.notifications {
            if let Err(e) = notifications.queue_verification_email(&user.email, &user.name, &token)
            {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to queue verification email");
            }
        }

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// Mark the token's user as verified. Verifying twice is not an error.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> UserResult<UserResponse> {
        let mut user = self.user_for_token(token, TokenPurpose::EmailVerification).await?;

        if user.email_verified {
            return Ok(user.into());
        }

        user.email_verified = true;
        user.touch();
        let user = self.repository.update(user).await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(user.into())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<LoginResponse> {
        let user = self
            .repository
            .get_by_email(&normalize_email(&input.email))
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(UserError::EmailNotVerified);
        }

        let token = self.issue(user.id, TokenPurpose::Session)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    /// Mail a password reset link. Unknown emails are `EmailNotFound`.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> UserResult<()> {
        let user = self
            .repository
            .get_by_email(&normalize_email(email))
            .await?
            .ok_or(UserError::EmailNotFound)?;

        let token = self.issue(user.id, TokenPurpose::PasswordReset)?;
        if let Some(notifications) = &self.notifications {
            if let Err(e) =
                notifications.queue_password_reset_email(&user.email, &user.name, &token)
            {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to queue password reset email");
            }
        }

        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    #[instrument(skip(self, token, password))]
    pub async fn reset_password(&self, token: &str, password: &str) -> UserResult<()> {
        validate_password(password)?;

        let mut user = self.user_for_token(token, TokenPurpose::PasswordReset).await?;
        user.password_hash = hash_password(password)?;
        user.touch();
        self.repository.update(user).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: Uuid) -> UserResult<UserResponse> {
        self.get_user(id).await.map(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> UserResult<UserResponse> {
        let mut user = self.get_user(id).await?;

        if let Some(new_password) = &input.new_password {
            let old_password = input.old_password.as_deref().ok_or_else(|| {
                UserError::Validation("Old password is required to set a new password".to_string())
            })?;
            if !verify_password(old_password, &user.password_hash)? {
                return Err(UserError::WrongPassword);
            }
            validate_password(new_password)?;
            user.password_hash = hash_password(new_password)?;
        }

        if let Some(email) = &input.email {
            let email = normalize_email(email);
            if email != user.email {
                if self.repository.get_by_email(&email).await?.is_some() {
                    return Err(UserError::DuplicateEmail(email));
                }
                user.email = email;
            }
        }

        if let Some(name) = input.name {
            user.name = name.trim().to_string();
        }

        user.touch();
        let user = self.repository.update(user).await?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Mint a token of any purpose. Exposed for tests and tooling.
    pub fn issue(&self, user_id: Uuid, purpose: TokenPurpose) -> UserResult<String> {
        self.jwt
            .issue(user_id, purpose)
            .map_err(|e| UserError::Token(e.to_string()))
    }

    async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn user_for_token(&self, token: &str, purpose: TokenPurpose) -> UserResult<User> {
        let claims = self.jwt.verify(token, purpose).map_err(|e| {
            tracing::debug!(error = %e, %purpose, "Rejected token");
            UserError::InvalidToken
        })?;
        let user_id = claims.user_id().map_err(|_| UserError::InvalidToken)?;

        self.repository
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::InvalidToken)
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            jwt: self.jwt.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

#[async_trait]
impl<R: UserRepository + 'static> IdentityResolver for UserService<R> {
    async fn resolve(&self, user_id: Uuid) -> Result<Option<AuthUser>, AppError> {
        let user = self.repository.get_by_id(user_id).await?;
        Ok(user.map(|u| u.to_auth_user()))
    }
}

#[async_trait]
impl<R: UserRepository + 'static> UserDirectory for UserService<R> {
    async fn find_summary(&self, id: Uuid) -> UserResult<Option<UserSummary>> {
        let user = self.repository.get_by_id(id).await?;
        Ok(user.as_ref().map(UserSummary::from))
    }

    async fn find_summaries(&self, ids: &[Uuid]) -> UserResult<HashMap<Uuid, UserSummary>> {
        let users = self.repository.get_by_ids(ids).await?;
        Ok(users.iter().map(|u| (u.id, UserSummary::from(u))).collect())
    }
}

// Password helpers

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn validate_password(password: &str) -> UserResult<()> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if len > MAX_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "Password cannot exceed {} characters",
            MAX_PASSWORD_LEN
        )));
    }

    Ok(())
}
