//! Tenant lifecycle: registration, approval, provisioning and catch-up

use crate::cache::TenantCache;
use crate::config::{RegistrationConfig, StorageConfig};
use crate::context::{ConnectionRegistry, TenantContext};
use crate::credentials::CredentialStore;
use crate::crypto::hash_password;
use crate::domain::{
    next_tenant_code, slugify, CentralUser, CreateCentralUserInput, CreateTenantInput,
    DatabaseProvisioningStatus, RegisterTenantInput, RegistrationMetadata, Tenant, TenantStatus,
};
use crate::error::{AppError, Result};
use crate::migration::{ProvisioningReport, SchemaMigrator, SchemaReport};
use crate::provisioning::{ConnectionTestResult, ProvisionResult, TenantProvisioner};
use crate::repository::{CentralUserRepository, TenantRepository};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

/// Alerts an operator when a tenant needs manual attention
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OperatorNotifier: Send + Sync {
    async fn provisioning_failed(&self, tenant: &Tenant, reason: &str);
}

/// Default notifier: an error-level log line operators can alert on
pub struct LoggingNotifier;

#[async_trait]
impl OperatorNotifier for LoggingNotifier {
    async fn provisioning_failed(&self, tenant: &Tenant, reason: &str) {
        error!(
            tenant_id = tenant.id,
            subdomain = %tenant.subdomain,
            reason,
            "Tenant provisioning failed, manual intervention required"
        );
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProvisionOutcome {
    Provisioned { report: ProvisioningReport },
    Failed { reason: String },
}

impl ProvisionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProvisionOutcome::Provisioned { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub owner: CentralUser,
    pub tenant: Tenant,
    pub provisioning: Option<ProvisionOutcome>,
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub tenant: Tenant,
    pub provisioning: Option<ProvisionOutcome>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CatchUpSummary {
    pub succeeded: Vec<u64>,
    pub failed: Vec<(u64, String)>,
}

pub struct TenantLifecycleService {
    tenants: Arc<dyn TenantRepository>,
    owners: Arc<dyn CentralUserRepository>,
    credentials: Arc<CredentialStore>,
    provisioner: Arc<TenantProvisioner>,
    migrator: Arc<SchemaMigrator>,
    notifier: Arc<dyn OperatorNotifier>,
    central: MySqlPool,
    storage: StorageConfig,
    registration: RegistrationConfig,
    tenant_pool_size: u32,
    cache: Option<TenantCache>,
}

impl TenantLifecycleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        owners: Arc<dyn CentralUserRepository>,
        credentials: Arc<CredentialStore>,
        provisioner: Arc<TenantProvisioner>,
        migrator: Arc<SchemaMigrator>,
        central: MySqlPool,
        storage: StorageConfig,
        registration: RegistrationConfig,
    ) -> Self {
        Self {
            tenants,
            owners,
            credentials,
            provisioner,
            migrator,
            notifier: Arc::new(LoggingNotifier),
            central,
            storage,
            registration,
            tenant_pool_size: 5,
            cache: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OperatorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_cache(mut self, cache: TenantCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_tenant_pool_size(mut self, size: u32) -> Self {
        self.tenant_pool_size = size;
        self
    }

    /// Fresh context for one unit of work, starting on the central store
    pub fn new_context(&self) -> TenantContext {
        TenantContext::new(
            ConnectionRegistry::new(self.central.clone())
                .with_max_connections(self.tenant_pool_size),
            self.credentials.clone(),
            self.storage.clone(),
        )
    }

    async fn get_tenant(&self, id: u64) -> Result<Tenant> {
        self.tenants
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))
    }

    /// Create the owner account and the tenant, then provision right away
    /// when auto-approval and auto-provisioning are both on.
    pub async fn register(&self, input: RegisterTenantInput) -> Result<RegistrationOutcome> {
        input.validate()?;

        let subdomain = match input.subdomain.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => slugify(&input.company_name, '-'),
        };
        if self.tenants.find_by_subdomain(&subdomain).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Subdomain '{}' is already taken",
                subdomain
            )));
        }
        if self.owners.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let now = Utc::now();
        let (status, approved_at) = if self.registration.auto_approve {
            (TenantStatus::Active, Some(now))
        } else {
            (TenantStatus::Pending, None)
        };

        let tenant_input = CreateTenantInput {
            name: input.company_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            subdomain,
            status,
            approved_at,
            approved_by_id: None,
            metadata: Some(RegistrationMetadata {
                registration_date: Some(now),
                ip_address: input.ip_address.clone(),
                user_agent: input.user_agent.clone(),
                registration_source: input.source.clone().unwrap_or_else(|| "web".to_string()),
            }),
        };
        tenant_input.validate()?;

        let code = next_tenant_code(self.owners.latest_tenant_code().await?.as_deref());
        let owner = self
            .owners
            .create(&CreateCentralUserInput {
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                email: input.email.clone(),
                phone: input.phone.clone(),
                password_hash: hash_password(&input.password)?,
                code,
                email_verified_at: None,
            })
            .await?;

        let tenant = self.tenants.create(&tenant_input).await?;

        info!(
            tenant_id = tenant.id,
            owner_id = owner.id,
            status = %tenant.status,
            "Tenant registered"
        );

        let provisioning = self.provision_if_enabled(&tenant).await?;
        let tenant = self.get_tenant(tenant.id).await?;

        Ok(RegistrationOutcome {
            owner,
            tenant,
            provisioning,
        })
    }

    /// Activate a pending tenant, then provision when auto-provisioning is on
    pub async fn approve(
        &self,
        tenant_id: u64,
        approved_by_id: Option<u64>,
    ) -> Result<ApprovalOutcome> {
        let tenant = self.tenants.approve(tenant_id, approved_by_id).await?;
        info!(tenant_id, "Tenant approved");

        let provisioning = self.provision_if_enabled(&tenant).await?;
        let tenant = self.get_tenant(tenant_id).await?;

        Ok(ApprovalOutcome {
            tenant,
            provisioning,
        })
    }

    async fn provision_if_enabled(&self, tenant: &Tenant) -> Result<Option<ProvisionOutcome>> {
        if tenant.status == TenantStatus::Active && self.registration.auto_provisioning {
            Ok(Some(self.provision(tenant, false).await?))
        } else {
            Ok(None)
        }
    }

    /// Create, migrate and seed the tenant's store.
    ///
    /// Pipeline failures are not errors: the tenant is marked failed and sent
    /// back to `pending`, an operator is notified and `Failed` is returned.
    /// Only central-store bookkeeping failures surface as `Err`.
    pub async fn provision(&self, tenant: &Tenant, seed_demo: bool) -> Result<ProvisionOutcome> {
        self.tenants
            .update_provisioning_status(tenant.id, DatabaseProvisioningStatus::Provisioning)
            .await?;

        if let ProvisionResult::Failed { message } =
            self.provisioner.create_database(tenant).await
        {
            return self.fail(tenant, message).await;
        }

        let mut ctx = self.new_context();
        let report = match self
            .migrator
            .migrate_and_seed(ctx.connections_mut(), tenant, seed_demo)
            .await
        {
            Ok(report) => report,
            Err(e) => return self.fail(tenant, e.to_string()).await,
        };

        self.tenants
            .update_provisioning_status(tenant.id, DatabaseProvisioningStatus::Provisioned)
            .await?;
        self.tenants
            .update_status(tenant.id, TenantStatus::Active)
            .await?;

        // A recreated store must not see entries cached for the previous one.
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.flush_namespace(&tenant.cache_prefix()).await {
                warn!(tenant_id = tenant.id, error = %e, "Failed to flush tenant cache");
            }
        }

        info!(tenant_id = tenant.id, "Tenant provisioned");
        Ok(ProvisionOutcome::Provisioned { report })
    }

    async fn fail(&self, tenant: &Tenant, reason: String) -> Result<ProvisionOutcome> {
        error!(tenant_id = tenant.id, reason = %reason, "Provisioning failed");
        self.tenants.mark_provisioning_failed(tenant.id).await?;
        self.notifier.provisioning_failed(tenant, &reason).await;
        Ok(ProvisionOutcome::Failed { reason })
    }

    pub async fn provision_by_id(
        &self,
        tenant_id: u64,
        seed_demo: bool,
    ) -> Result<ProvisionOutcome> {
        let tenant = self.get_tenant(tenant_id).await?;
        self.provision(&tenant, seed_demo).await
    }

    /// Verify a tenant's stored credentials against its store
    pub async fn test_connection(&self, tenant_id: u64) -> Result<ConnectionTestResult> {
        let record = self.credentials.find(tenant_id).await?.ok_or_else(|| {
            AppError::NotConfigured(format!(
                "Tenant database not configured for tenant {}",
                tenant_id
            ))
        })?;
        Ok(self.provisioner.test_connection(&record).await)
    }

    /// Apply pending core and module migrations to provisioned tenants.
    ///
    /// Each tenant runs in its own context; one tenant failing does not stop
    /// the others.
    pub async fn catch_up(&self, tenant_id: Option<u64>) -> Result<CatchUpSummary> {
        let tenants = match tenant_id {
            Some(id) => vec![self.get_tenant(id).await?],
            None => self.tenants.list_provisioned().await?,
        };

        let mut summary = CatchUpSummary::default();
        for tenant in tenants {
            if !tenant.is_provisioned() {
                warn!(tenant_id = tenant.id, "Skipping catch-up, tenant store not provisioned");
                summary
                    .failed
                    .push((tenant.id, "tenant store not provisioned".to_string()));
                continue;
            }

            let mut ctx = self.new_context();
            let migrator = self.migrator.clone();
            let result: Result<SchemaReport> = ctx
                .for_tenant(&tenant, move |ctx| {
                    Box::pin(async move {
                        let pool = ctx.default_pool()?;
                        let (report, _) = migrator.migrate_schema(&pool).await?;
                        Ok(report)
                    })
                })
                .await;

            match result {
                Ok(report)
                    if report.core.failed.is_empty() && report.failed_modules().is_empty() =>
                {
                    info!(tenant_id = tenant.id, "Tenant caught up");
                    summary.succeeded.push(tenant.id);
                }
                Ok(report) => {
                    let mut failures = report.core.failed.clone();
                    failures.extend(report.failed_modules().into_iter().map(str::to_string));
                    warn!(
                        tenant_id = tenant.id,
                        failed = ?failures,
                        "Tenant caught up with failures"
                    );
                    summary
                        .failed
                        .push((tenant.id, format!("failed: {}", failures.join(", "))));
                }
                Err(e) => {
                    error!(tenant_id = tenant.id, error = %e, "Tenant catch-up failed");
                    summary.failed.push((tenant.id, e.to_string()));
                }
            }
        }

        Ok(summary)
    }
}
