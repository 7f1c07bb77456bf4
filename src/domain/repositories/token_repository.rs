//! Repository trait for API tokens.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// An issued API token. Only the keyed hash of the secret is stored.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i64,
    pub name: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Storage of API tokens used for bearer authentication.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTokenRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Returns the active (non-revoked) token with this hash.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_active(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError>;

    /// Records that the token was just used.
    async fn touch(&self, token_id: i64) -> Result<(), AppError>;

    /// Stores a new token hash under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the name or hash is already taken.
    async fn create(&self, name: &str, token_hash: &str) -> Result<ApiToken, AppError>;

    /// Lists every token, newest first.
    async fn list(&self) -> Result<Vec<ApiToken>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError>;

    /// Marks a token revoked.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the token does not exist.
    async fn revoke(&self, id: i64) -> Result<(), AppError>;
}
