//! Creation and teardown of isolated tenant stores

use super::admin::DatabaseAdmin;
use crate::config::TenantDatabaseConfig;
use crate::credentials::{CredentialStore, NewCredentials};
use crate::domain::{ConnectionDescriptor, Tenant, TenantDatabase, TENANT_CHARSET, TENANT_COLLATION};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Length of generated principal passwords
pub const PASSWORD_LENGTH: usize = 16;

/// Hosts cleared of a stale principal before it is recreated
const STALE_PRINCIPAL_HOSTS: [&str; 3] = ["localhost", "%", "127.0.0.1"];
/// Hosts the principal is created and granted at
const PRINCIPAL_HOSTS: [&str; 2] = ["localhost", "%"];

/// Outcome of [`TenantProvisioner::create_database`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProvisionResult {
    Provisioned {
        database_name: String,
        username: String,
    },
    Failed {
        message: String,
    },
}

impl ProvisionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProvisionResult::Provisioned { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Random alphanumeric password with at least one lowercase, uppercase and digit
pub fn generate_password() -> String {
    use rand::seq::SliceRandom;
    use rand::Rng;
    const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const DIGIT: &[u8] = b"0123456789";

    let mut rng = rand::thread_rng();
    let mut password: Vec<char> = Vec::with_capacity(PASSWORD_LENGTH);
    for set in [LOWER, UPPER, DIGIT] {
        password.push(set[rng.gen_range(0..set.len())] as char);
    }

    let all: Vec<u8> = [LOWER, UPPER, DIGIT].concat();
    while password.len() < PASSWORD_LENGTH {
        password.push(all[rng.gen_range(0..all.len())] as char);
    }

    password.shuffle(&mut rng);
    password.into_iter().collect()
}

pub struct TenantProvisioner {
    admin: Arc<dyn DatabaseAdmin>,
    credentials: Arc<CredentialStore>,
    config: TenantDatabaseConfig,
}

impl TenantProvisioner {
    pub fn new(
        admin: Arc<dyn DatabaseAdmin>,
        credentials: Arc<CredentialStore>,
        config: TenantDatabaseConfig,
    ) -> Self {
        Self {
            admin,
            credentials,
            config,
        }
    }

    /// Create (or recreate) the tenant's store, principal and credentials row.
    ///
    /// Never returns an error: every failure becomes [`ProvisionResult::Failed`].
    pub async fn create_database(&self, tenant: &Tenant) -> ProvisionResult {
        match self.try_create_database(tenant).await {
            Ok(result) => result,
            Err(e) => {
                error!(tenant_id = tenant.id, error = %e, "Database creation failed");
                ProvisionResult::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn try_create_database(&self, tenant: &Tenant) -> Result<ProvisionResult> {
        if let Some(existing) = self.credentials.find(tenant.id).await? {
            self.teardown(&existing).await;
            self.credentials.remove(&existing).await?;
        }

        let database_name = tenant.database_name();
        let username = tenant.database_username();
        let password = generate_password();

        self.admin.drop_database(&database_name).await?;
        self.admin
            .create_database(&database_name, TENANT_CHARSET, TENANT_COLLATION)
            .await?;

        for host in STALE_PRINCIPAL_HOSTS {
            if let Err(e) = self.admin.drop_user(&username, host).await {
                warn!(
                    tenant_id = tenant.id,
                    host,
                    error = %e,
                    "Ignoring failure to drop stale principal"
                );
            }
        }

        for host in PRINCIPAL_HOSTS {
            self.admin.create_user(&username, host, &password).await?;
            self.admin.grant_all(&database_name, &username, host).await?;
        }
        self.admin.flush_privileges().await?;

        // Written last: a row only ever describes a complete store.
        self.credentials
            .save(
                tenant.id,
                &NewCredentials {
                    host: self.config.host.clone(),
                    port: self.config.port,
                    database_name: database_name.clone(),
                    username: username.clone(),
                    password,
                },
            )
            .await?;

        info!(tenant_id = tenant.id, database = %database_name, "Tenant database provisioned");
        Ok(ProvisionResult::Provisioned {
            database_name,
            username,
        })
    }

    /// Best-effort removal of a previous store and principal
    async fn teardown(&self, existing: &TenantDatabase) {
        if let Err(e) = self.admin.drop_database(&existing.database_name).await {
            warn!(
                tenant_id = existing.tenant_id,
                database = %existing.database_name,
                error = %e,
                "Ignoring failure to drop previous tenant database"
            );
        }
        for host in PRINCIPAL_HOSTS {
            if let Err(e) = self.admin.drop_user(&existing.username, host).await {
                warn!(
                    tenant_id = existing.tenant_id,
                    host,
                    error = %e,
                    "Ignoring failure to drop previous principal"
                );
            }
        }
    }

    /// Verify stored credentials by connecting with them. Never returns an error.
    pub async fn test_connection(&self, record: &TenantDatabase) -> ConnectionTestResult {
        let outcome = async {
            let descriptor = self.credentials.descriptor_for(record)?;
            self.admin.ping(&descriptor).await?;
            self.credentials.mark_verified(record).await
        }
        .await;

        match outcome {
            Ok(()) => ConnectionTestResult {
                success: true,
                message: None,
            },
            Err(e) => {
                warn!(
                    tenant_id = record.tenant_id,
                    error = %e,
                    "Tenant database connection test failed"
                );
                ConnectionTestResult {
                    success: false,
                    message: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn get_tenant_connection_config(
        &self,
        tenant: &Tenant,
    ) -> Result<ConnectionDescriptor> {
        self.credentials.connection_descriptor(tenant).await
    }
}
