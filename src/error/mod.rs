//! Unified error handling for the tenancy core

use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The tenant has no provisioned store yet; a caller asked for its
    /// connection too early.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Bootstrap seed failed: {0}")]
    BootstrapSeed(String),

    #[error("Seeder failed: {0}")]
    Seed(String),

    #[error("Credential decryption failed: {0}")]
    Decryption(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the provisioning pipeline must stop on this error.
    pub fn is_fatal_for_provisioning(&self) -> bool {
        matches!(
            self,
            AppError::Provisioning(_)
                | AppError::BootstrapSeed(_)
                | AppError::NotConfigured(_)
                | AppError::Decryption(_)
        )
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
