//! Central user repository

use crate::domain::{CentralUser, CreateCentralUserInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CentralUserRepository: Send + Sync {
    async fn create(&self, input: &CreateCentralUserInput) -> Result<CentralUser>;
    async fn find_by_email(&self, email: &str) -> Result<Option<CentralUser>>;
    /// Highest `TENANT-NNN` owner code issued so far
    async fn latest_tenant_code(&self) -> Result<Option<String>>;
}

pub struct CentralUserRepositoryImpl {
    pool: MySqlPool,
}

impl CentralUserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CentralUserRepository for CentralUserRepositoryImpl {
    async fn create(&self, input: &CreateCentralUserInput) -> Result<CentralUser> {
        sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, phone, password, code,
                               email_verified_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.password_hash)
        .bind(&input.code)
        .bind(input.email_verified_at)
        .execute(&self.pool)
        .await?;

        self.find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CentralUser>> {
        let user = sqlx::query_as::<_, CentralUser>(
            r#"
            SELECT id, first_name, last_name, email, phone, password, code,
                   email_verified_at, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn latest_tenant_code(&self) -> Result<Option<String>> {
        // Lexical order breaks past TENANT-999, so sort on the numeric suffix.
        let code: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT code FROM users
            WHERE code LIKE 'TENANT-%'
            ORDER BY CAST(SUBSTRING(code, 8) AS UNSIGNED) DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(code.map(|(c,)| c))
    }
}
