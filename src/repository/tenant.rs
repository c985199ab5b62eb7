//! Tenant repository (central store)

use crate::domain::{CreateTenantInput, DatabaseProvisioningStatus, Tenant, TenantStatus};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::MySqlPool;

const TENANT_COLUMNS: &str = "id, name, email, phone, subdomain, status, \
    database_provisioning_status, approved_at, approved_by_id, metadata, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, input: &CreateTenantInput) -> Result<Tenant>;
    async fn find_by_id(&self, id: u64) -> Result<Option<Tenant>>;
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>>;
    /// Tenants whose store is fully provisioned
    async fn list_provisioned(&self) -> Result<Vec<Tenant>>;
    async fn update_status(&self, id: u64, status: TenantStatus) -> Result<()>;
    async fn update_provisioning_status(
        &self,
        id: u64,
        status: DatabaseProvisioningStatus,
    ) -> Result<()>;
    /// Mark the store failed and send the tenant back to `pending`
    async fn mark_provisioning_failed(&self, id: u64) -> Result<()>;
    async fn approve(&self, id: u64, approved_by_id: Option<u64>) -> Result<Tenant>;
}

pub struct TenantRepositoryImpl {
    pool: MySqlPool,
}

impl TenantRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for TenantRepositoryImpl {
    async fn create(&self, input: &CreateTenantInput) -> Result<Tenant> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (name, email, phone, subdomain, status, database_provisioning_status,
                                 approved_at, approved_by_id, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'none', ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.subdomain)
        .bind(input.status)
        .bind(input.approved_at)
        .bind(input.approved_by_id)
        .bind(input.metadata.clone().map(Json))
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create tenant")))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE id = ?",
            TENANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE subdomain = ?",
            TENANT_COLUMNS
        ))
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn list_provisioned(&self) -> Result<Vec<Tenant>> {
        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE database_provisioning_status = 'provisioned' ORDER BY id",
            TENANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn update_status(&self, id: u64, status: TenantStatus) -> Result<()> {
        let result = sqlx::query("UPDATE tenants SET status = ?, updated_at = NOW() WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tenant {} not found", id)));
        }
        Ok(())
    }

    async fn update_provisioning_status(
        &self,
        id: u64,
        status: DatabaseProvisioningStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE tenants SET database_provisioning_status = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tenant {} not found", id)));
        }
        Ok(())
    }

    async fn mark_provisioning_failed(&self, id: u64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tenants
            SET database_provisioning_status = 'failed', status = 'pending', updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn approve(&self, id: u64, approved_by_id: Option<u64>) -> Result<Tenant> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET status = 'active', approved_at = NOW(), approved_by_id = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(approved_by_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tenant {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))
    }
}
