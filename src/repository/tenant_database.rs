//! Tenant database credentials repository

use crate::domain::{CreateTenantDatabaseInput, TenantDatabase};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantDatabaseRepository: Send + Sync {
    async fn find_by_tenant(&self, tenant_id: u64) -> Result<Option<TenantDatabase>>;
    async fn create(&self, input: &CreateTenantDatabaseInput) -> Result<TenantDatabase>;
    async fn delete(&self, id: u64) -> Result<()>;
    /// Stamp `last_verified_at` after a successful connection test
    async fn touch_verified(&self, id: u64) -> Result<()>;
}

pub struct TenantDatabaseRepositoryImpl {
    pool: MySqlPool,
}

impl TenantDatabaseRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<TenantDatabase>> {
        let row = sqlx::query_as::<_, TenantDatabase>(
            r#"
            SELECT id, tenant_id, host, port, database_name, username, encrypted_password,
                   provisioning_status, provisioned_at, last_verified_at, created_at, updated_at
            FROM tenant_databases
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl TenantDatabaseRepository for TenantDatabaseRepositoryImpl {
    async fn find_by_tenant(&self, tenant_id: u64) -> Result<Option<TenantDatabase>> {
        let row = sqlx::query_as::<_, TenantDatabase>(
            r#"
            SELECT id, tenant_id, host, port, database_name, username, encrypted_password,
                   provisioning_status, provisioned_at, last_verified_at, created_at, updated_at
            FROM tenant_databases
            WHERE tenant_id = ?
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, input: &CreateTenantDatabaseInput) -> Result<TenantDatabase> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenant_databases (tenant_id, host, port, database_name, username,
                                          encrypted_password, provisioning_status, provisioned_at,
                                          created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW(), NOW())
            "#,
        )
        .bind(input.tenant_id)
        .bind(&input.host)
        .bind(input.port)
        .bind(&input.database_name)
        .bind(&input.username)
        .bind(&input.encrypted_password)
        .bind(input.provisioning_status)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_id()).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Failed to create tenant database record"))
        })
    }

    async fn delete(&self, id: u64) -> Result<()> {
        sqlx::query("DELETE FROM tenant_databases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_verified(&self, id: u64) -> Result<()> {
        sqlx::query(
            "UPDATE tenant_databases SET last_verified_at = NOW(), updated_at = NOW() WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
