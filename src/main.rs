//! Tenancy Core CLI
//!
//! - `tenancy-core migrate-central` - apply the central store migrations
//! - `tenancy-core register ...` - register a tenant and its owner
//! - `tenancy-core approve <id>` - approve a pending tenant
//! - `tenancy-core provision <id> [--demo]` - (re)provision a tenant store
//! - `tenancy-core test-connection <id>` - verify stored tenant credentials
//! - `tenancy-core catch-up [--tenant <id>]` - migrate provisioned tenants

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tenancy_core::{
    cache::TenantCache,
    config::Config,
    credentials::CredentialStore,
    domain::RegisterTenantInput,
    migration::{run_central_migrations, FsSchemaRunner, SchemaMigrator},
    modules::{ModulePlanner, StatusFileModuleRegistry},
    provisioning::{MySqlDatabaseAdmin, TenantProvisioner},
    repository::{CentralUserRepositoryImpl, TenantDatabaseRepositoryImpl, TenantRepositoryImpl},
    seeding::{AdminUserSeeder, SeedOrchestrator, SeederRegistry},
    service::{ProvisionOutcome, TenantLifecycleService},
    telemetry,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tenancy-core")]
#[command(version)]
#[command(about = "Tenant provisioning and schema orchestration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the central store migrations
    MigrateCentral,

    /// Register a tenant together with its owner account
    Register(RegisterArgs),

    /// Approve a pending tenant
    Approve {
        tenant_id: u64,
        /// Central user approving the tenant
        #[arg(long)]
        approved_by: Option<u64>,
    },

    /// Create, migrate and seed a tenant store
    Provision {
        tenant_id: u64,
        /// Also run every module's demo seeders
        #[arg(long)]
        demo: bool,
    },

    /// Verify a tenant's stored credentials
    TestConnection { tenant_id: u64 },

    /// Apply pending migrations to provisioned tenant stores
    CatchUp {
        /// Only this tenant
        #[arg(long)]
        tenant: Option<u64>,
    },
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    company: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "TENANT_OWNER_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    subdomain: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

async fn build_service(config: &Config) -> Result<TenantLifecycleService> {
    let central = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    info!("Connected to central database");

    let tenants = Arc::new(TenantRepositoryImpl::new(central.clone()));
    let owners = Arc::new(CentralUserRepositoryImpl::new(central.clone()));
    let credentials = Arc::new(CredentialStore::new(
        Arc::new(TenantDatabaseRepositoryImpl::new(central.clone())),
        config.credentials_key.clone(),
    ));

    let provisioner = Arc::new(TenantProvisioner::new(
        Arc::new(MySqlDatabaseAdmin::new(central.clone())),
        credentials.clone(),
        config.tenant_database.clone(),
    ));

    let modules = &config.modules;
    let runner = Arc::new(FsSchemaRunner::new(
        &modules.core_migrations_path,
        &modules.modules_path,
    ));
    let planner = Arc::new(ModulePlanner::from_config(
        Arc::new(StatusFileModuleRegistry::new(&modules.status_file)),
        modules,
    ));
    let seeds = Arc::new(SeedOrchestrator::new(
        owners.clone(),
        Arc::new(AdminUserSeeder),
        SeederRegistry::new(&modules.seeders_path),
        runner.clone(),
        modules,
    ));
    let migrator = Arc::new(SchemaMigrator::new(
        runner,
        planner,
        seeds,
        credentials.clone(),
        modules.excluded_core_migrations.clone(),
    ));

    let service = TenantLifecycleService::new(
        tenants,
        owners,
        credentials,
        provisioner,
        migrator,
        central,
        config.storage.clone(),
        config.registration.clone(),
    )
    .with_tenant_pool_size(config.tenant_database.max_connections);

    match TenantCache::new(&config.redis).await {
        Ok(cache) => Ok(service.with_cache(cache)),
        Err(e) => {
            warn!(error = %e, "Redis unavailable, tenant cache flushing disabled");
            Ok(service)
        }
    }
}

fn report_provisioning(outcome: &ProvisionOutcome) {
    match outcome {
        ProvisionOutcome::Provisioned { report } => {
            info!(
                core_applied = report.schema.core.applied.len(),
                modules = report.schema.modules.len(),
                seeders = report.seeds.ran.len(),
                "Provisioning complete"
            );
            for module in report.schema.failed_modules() {
                warn!(module, "Module migration failed");
            }
        }
        ProvisionOutcome::Failed { reason } => warn!(reason = %reason, "Provisioning failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    telemetry::init(&config.telemetry);

    match cli.command {
        Commands::MigrateCentral => run_central_migrations(&config).await?,
        Commands::Register(args) => {
            let service = build_service(&config).await?;
            let outcome = service
                .register(RegisterTenantInput {
                    first_name: args.first_name,
                    last_name: args.last_name,
                    email: args.email,
                    phone: args.phone,
                    password: args.password,
                    company_name: args.company,
                    subdomain: args.subdomain,
                    ip_address: None,
                    user_agent: None,
                    source: Some("cli".to_string()),
                })
                .await?;
            info!(
                tenant_id = outcome.tenant.id,
                subdomain = %outcome.tenant.subdomain,
                status = %outcome.tenant.status,
                "Tenant registered"
            );
            if let Some(provisioning) = &outcome.provisioning {
                report_provisioning(provisioning);
            }
        }
        Commands::Approve {
            tenant_id,
            approved_by,
        } => {
            let service = build_service(&config).await?;
            let outcome = service.approve(tenant_id, approved_by).await?;
            if let Some(provisioning) = &outcome.provisioning {
                report_provisioning(provisioning);
            }
        }
        Commands::Provision { tenant_id, demo } => {
            let service = build_service(&config).await?;
            let outcome = service.provision_by_id(tenant_id, demo).await?;
            report_provisioning(&outcome);
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        Commands::TestConnection { tenant_id } => {
            let service = build_service(&config).await?;
            let result = service.test_connection(tenant_id).await?;
            let message = result.message.unwrap_or_default();
            if result.success {
                info!(tenant_id, "Connection OK {}", message);
            } else {
                warn!(tenant_id, "Connection failed: {}", message);
                std::process::exit(1);
            }
        }
        Commands::CatchUp { tenant } => {
            let service = build_service(&config).await?;
            let summary = service.catch_up(tenant).await?;
            info!(
                succeeded = summary.succeeded.len(),
                failed = summary.failed.len(),
                "Catch-up complete"
            );
            for (tenant_id, reason) in &summary.failed {
                warn!(tenant_id, reason = %reason, "Tenant catch-up failed");
            }
            if !summary.failed.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
