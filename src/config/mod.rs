//! Configuration management for the tenancy core

use crate::crypto::EncryptionKey;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Modules that belong to the central application and never reach a tenant store
pub const DEFAULT_EXCLUDED_MODULES: &[&str] = &[
    "MultiTenancyCore",
    "SubscriptionManagement",
    "PayPalGateway",
    "StripeGateway",
    "RazorpayGateway",
    "LandingPage",
    "Billing",
];

/// Modules migrated first, in this exact order, because later modules
/// reference their tables
pub const DEFAULT_PRIORITY_MODULES: &[&str] = &[
    "SystemCore",
    "FieldManager",   // clients
    "SiteAttendance", // sites
    "BreakSystem",    // attendance_breaks
    "Payroll",        // payroll_records
    "GeofenceSystem", // geofence_groups, needs sites
    "AccountingCore",
    "WMSInventoryCore",
];

/// Core migration file-name fragments for process infrastructure tables
pub const DEFAULT_EXCLUDED_CORE_MIGRATIONS: &[&str] = &[
    "telescope_entries",
    "failed_jobs",
    "jobs",
    "job_batches",
    "cache",
    "cache_locks",
    "sessions",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Central database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Key sealing tenant database passwords
    pub credentials_key: EncryptionKey,
    /// Where tenant databases live
    pub tenant_database: TenantDatabaseConfig,
    /// Module discovery, ordering and seeding configuration
    pub modules: TenantModulesConfig,
    /// File storage and cache namespacing
    pub storage: StorageConfig,
    /// Registration policy
    pub registration: RegistrationConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TenantDatabaseConfig {
    pub host: String,
    pub port: u16,
    /// Pool size for each tenant connection
    pub max_connections: u32,
}

impl Default for TenantDatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TenantModulesConfig {
    /// Root directory containing one sub-directory per module
    pub modules_path: PathBuf,
    /// JSON file mapping module name to its activation flag
    pub status_file: PathBuf,
    /// Directory holding the core `*.sql` migrations
    pub core_migrations_path: PathBuf,
    /// Directory holding named `*.sql` seeders
    pub seeders_path: PathBuf,
    pub excluded_modules: Vec<String>,
    pub priority_modules: Vec<String>,
    pub additional_tenant_seeders: Vec<String>,
    pub essential_module_seeders: Vec<String>,
    pub excluded_core_migrations: Vec<String>,
}

impl Default for TenantModulesConfig {
    fn default() -> Self {
        Self {
            modules_path: PathBuf::from("Modules"),
            status_file: PathBuf::from("modules_statuses.json"),
            core_migrations_path: PathBuf::from("database/migrations"),
            seeders_path: PathBuf::from("database/seeders"),
            excluded_modules: to_owned_list(DEFAULT_EXCLUDED_MODULES),
            priority_modules: to_owned_list(DEFAULT_PRIORITY_MODULES),
            additional_tenant_seeders: Vec::new(),
            essential_module_seeders: Vec::new(),
            excluded_core_migrations: to_owned_list(DEFAULT_EXCLUDED_CORE_MIGRATIONS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base storage directory; tenant roots live under `app/tenants/<id>`
    pub root: PathBuf,
    /// Public application URL used to build tenant storage URLs
    pub app_url: String,
    /// Cache prefix used outside of any tenant context
    pub cache_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
            app_url: "http://localhost".to_string(),
            cache_prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationConfig {
    pub auto_approve: bool,
    pub auto_provisioning: bool,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Parse a comma-separated list, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn env_list(name: &str, default: &[&str]) -> Vec<String> {
    env::var(name)
        .map(|s| parse_list(&s))
        .unwrap_or_else(|_| to_owned_list(default))
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            credentials_key: EncryptionKey::from_env()
                .context("TENANT_CREDENTIALS_KEY must be a base64-encoded 32-byte key")?,
            tenant_database: TenantDatabaseConfig {
                host: env::var("TENANT_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("TENANT_DB_PORT")
                    .unwrap_or_else(|_| "3306".to_string())
                    .parse()
                    .context("Invalid TENANT_DB_PORT")?,
                max_connections: env::var("TENANT_DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            modules: {
                let defaults = TenantModulesConfig::default();
                TenantModulesConfig {
                    modules_path: env::var("MODULES_PATH")
                        .map(PathBuf::from)
                        .unwrap_or(defaults.modules_path),
                    status_file: env::var("MODULES_STATUS_FILE")
                        .map(PathBuf::from)
                        .unwrap_or(defaults.status_file),
                    core_migrations_path: env::var("CORE_MIGRATIONS_PATH")
                        .map(PathBuf::from)
                        .unwrap_or(defaults.core_migrations_path),
                    seeders_path: env::var("SEEDERS_PATH")
                        .map(PathBuf::from)
                        .unwrap_or(defaults.seeders_path),
                    excluded_modules: env_list("TENANT_EXCLUDED_MODULES", DEFAULT_EXCLUDED_MODULES),
                    priority_modules: env_list("TENANT_PRIORITY_MODULES", DEFAULT_PRIORITY_MODULES),
                    additional_tenant_seeders: env_list("TENANT_ADDITIONAL_SEEDERS", &[]),
                    essential_module_seeders: env_list("TENANT_ESSENTIAL_SEEDERS", &[]),
                    excluded_core_migrations: env_list(
                        "TENANT_EXCLUDED_CORE_MIGRATIONS",
                        DEFAULT_EXCLUDED_CORE_MIGRATIONS,
                    ),
                }
            },
            storage: StorageConfig {
                root: env::var("STORAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("storage")),
                app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost".to_string()),
                cache_prefix: env::var("CACHE_PREFIX").unwrap_or_default(),
            },
            registration: RegistrationConfig {
                auto_approve: env_flag("TENANT_AUTO_APPROVE"),
                auto_provisioning: env_flag("TENANT_AUTO_PROVISIONING"),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
        })
    }
}
