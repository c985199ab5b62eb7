//! First administrator of a freshly provisioned tenant store

use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::{debug, info};

/// Employee code given to the bootstrap administrator
pub const ADMIN_CODE: &str = "EMP-001";
/// Role assigned to the bootstrap administrator when the store defines it
pub const ADMIN_ROLE: &str = "admin";
const USER_MODEL_TYPE: &str = r"App\Models\User";

/// Identity handed to the bootstrap seeder for exactly one call
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    /// Hash copied from the owner's central account
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Mandatory first seeder. A failure here fails the whole provisioning run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BootstrapSeeder: Send + Sync {
    async fn seed(&self, pool: &MySqlPool, admin: &BootstrapAdmin) -> Result<()>;
}

/// Inserts the administrator into the tenant's `users` table
pub struct AdminUserSeeder;

impl AdminUserSeeder {
    async fn has_role_tables(pool: &MySqlPool) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_name IN ('roles', 'model_has_roles')
            "#,
        )
        .fetch_one(pool)
        .await?;
        Ok(count == 2)
    }
}

#[async_trait]
impl BootstrapSeeder for AdminUserSeeder {
    async fn seed(&self, pool: &MySqlPool, admin: &BootstrapAdmin) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, phone, password, code,
                               email_verified_at, created_at, updated_at)
            VALUES (?, ?, ?, '0000000000', ?, ?, NOW(), NOW(), NOW())
            "#,
        )
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(ADMIN_CODE)
        .execute(pool)
        .await?;
        let user_id = result.last_insert_id();

        if Self::has_role_tables(pool).await? {
            let assigned = sqlx::query(
                r#"
                INSERT INTO model_has_roles (role_id, model_type, model_id)
                SELECT id, ?, ? FROM roles WHERE name = ? LIMIT 1
                "#,
            )
            .bind(USER_MODEL_TYPE)
            .bind(user_id)
            .bind(ADMIN_ROLE)
            .execute(pool)
            .await?;
            debug!(user_id, roles = assigned.rows_affected(), "Admin role assignment");
        }

        info!(email = %admin.email, "Bootstrap administrator created");
        Ok(())
    }
}
