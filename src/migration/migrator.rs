//! Schema migration of tenant stores

use super::runner::SchemaRunner;
use crate::context::ConnectionRegistry;
use crate::credentials::CredentialStore;
use crate::domain::Tenant;
use crate::error::Result;
use crate::modules::{ModulePlan, ModulePlanner};
use crate::seeding::{SeedOrchestrator, SeedReport};
use serde::Serialize;
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoreMigrationReport {
    pub applied: Vec<String>,
    /// Infrastructure migrations that never reach a tenant store
    pub excluded: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModuleMigrationStatus {
    Migrated { applied: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleMigrationOutcome {
    pub module: String,
    pub status: ModuleMigrationStatus,
}

impl ModuleMigrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ModuleMigrationStatus::Migrated { .. })
    }
}

/// Core and module results for one store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub core: CoreMigrationReport,
    pub modules: Vec<ModuleMigrationOutcome>,
}

impl SchemaReport {
    pub fn failed_modules(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.module.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    pub schema: SchemaReport,
    pub seeds: SeedReport,
}

/// Name of the dedicated connection used while provisioning `tenant`
pub fn migration_connection_name(tenant: &Tenant) -> String {
    format!("tenant_{}", tenant.id)
}

pub struct SchemaMigrator {
    runner: Arc<dyn SchemaRunner>,
    planner: Arc<ModulePlanner>,
    seeds: Arc<SeedOrchestrator>,
    credentials: Arc<CredentialStore>,
    excluded_core_migrations: Vec<String>,
}

impl SchemaMigrator {
    pub fn new(
        runner: Arc<dyn SchemaRunner>,
        planner: Arc<ModulePlanner>,
        seeds: Arc<SeedOrchestrator>,
        credentials: Arc<CredentialStore>,
        excluded_core_migrations: Vec<String>,
    ) -> Self {
        Self {
            runner,
            planner,
            seeds,
            credentials,
            excluded_core_migrations,
        }
    }

    fn is_excluded_core(&self, migration: &str) -> bool {
        self.excluded_core_migrations
            .iter()
            .any(|pattern| migration.contains(pattern.as_str()))
    }

    /// Apply core migrations except infrastructure tables. A failing
    /// migration is logged and skipped.
    pub async fn migrate_core(&self, pool: &MySqlPool) -> Result<CoreMigrationReport> {
        let mut report = CoreMigrationReport::default();

        for migration in self.runner.core_migrations().await? {
            if self.is_excluded_core(&migration) {
                report.excluded.push(migration);
                continue;
            }

            match self.runner.apply_core(pool, &migration).await {
                Ok(true) => report.applied.push(migration),
                Ok(false) => {}
                Err(e) => {
                    warn!(migration = %migration, error = %e, "Core migration failed, skipping");
                    report.failed.push(migration);
                }
            }
        }

        Ok(report)
    }

    /// Migrate priority modules, then the remaining ones. Each module is
    /// isolated: a failure is recorded and the loop carries on.
    pub async fn migrate_modules(
        &self,
        pool: &MySqlPool,
        plan: &ModulePlan,
    ) -> Vec<ModuleMigrationOutcome> {
        let mut outcomes = Vec::with_capacity(plan.priority.len() + plan.remaining.len());

        for module in plan.migration_order() {
            let status = match self.runner.apply_module(pool, module).await {
                Ok(applied) => ModuleMigrationStatus::Migrated { applied },
                Err(e) => {
                    error!(module, error = %e, "Module migration failed");
                    ModuleMigrationStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(ModuleMigrationOutcome {
                module: module.to_string(),
                status,
            });
        }

        outcomes
    }

    /// Ledger, core migrations and planned module migrations on one store
    pub async fn migrate_schema(&self, pool: &MySqlPool) -> Result<(SchemaReport, ModulePlan)> {
        self.runner.install_ledger(pool).await?;
        let core = self.migrate_core(pool).await?;
        let plan = self.planner.plan().await?;
        let modules = self.migrate_modules(pool, &plan).await;
        Ok((SchemaReport { core, modules }, plan))
    }

    /// Build and seed a freshly provisioned store.
    ///
    /// Runs on the dedicated `tenant_<id>` connection; the registry's default
    /// connection is restored afterwards whatever the outcome.
    pub async fn migrate_and_seed(
        &self,
        registry: &mut ConnectionRegistry,
        tenant: &Tenant,
        seed_demo: bool,
    ) -> Result<ProvisioningReport> {
        let descriptor = self.credentials.connection_descriptor(tenant).await?;
        let connection = migration_connection_name(tenant);
        registry.configure(connection.as_str(), descriptor);

        let central = registry.default_name().to_string();
        let mut scope = registry.scoped_default(connection.as_str());
        let pool = scope.pool(&connection)?;

        let (schema, plan) = self.migrate_schema(&pool).await?;
        let seeds = self
            .seeds
            .run(&mut scope, &connection, tenant, &central, &plan, seed_demo)
            .await?;

        info!(
            tenant_id = tenant.id,
            core_applied = schema.core.applied.len(),
            modules = schema.modules.len(),
            failed_modules = schema.failed_modules().len(),
            "Tenant store migrated and seeded"
        );
        Ok(ProvisioningReport { schema, seeds })
    }
}
