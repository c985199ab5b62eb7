//! Tenant database (credentials row) and connection descriptor

use super::common::impl_mysql_string_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::FromRow;

/// Default character set of every tenant database
pub const TENANT_CHARSET: &str = "utf8mb4";
/// Default collation of every tenant database
pub const TENANT_COLLATION: &str = "utf8mb4_unicode_ci";

/// How the credentials row came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TenantDatabaseStatus {
    #[default]
    Provisioned,
    /// Entered by an operator against a pre-existing database
    Manual,
    Failed,
}

impl std::str::FromStr for TenantDatabaseStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "provisioned" => Ok(TenantDatabaseStatus::Provisioned),
            "manual" => Ok(TenantDatabaseStatus::Manual),
            "failed" => Ok(TenantDatabaseStatus::Failed),
            _ => Err(format!("Unknown tenant database status: {}", s)),
        }
    }
}

impl std::fmt::Display for TenantDatabaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantDatabaseStatus::Provisioned => write!(f, "provisioned"),
            TenantDatabaseStatus::Manual => write!(f, "manual"),
            TenantDatabaseStatus::Failed => write!(f, "failed"),
        }
    }
}

impl_mysql_string_enum!(TenantDatabaseStatus);

/// Credentials of one tenant's isolated store. At most one row per tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantDatabase {
    pub id: u64,
    pub tenant_id: u64,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    pub provisioning_status: TenantDatabaseStatus,
    pub provisioned_at: Option<DateTime<Utc>>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TenantDatabase {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            tenant_id: 0,
            host: "localhost".to_string(),
            port: 3306,
            database_name: String::new(),
            username: String::new(),
            encrypted_password: String::new(),
            provisioning_status: TenantDatabaseStatus::default(),
            provisioned_at: None,
            last_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for persisting a credentials row
#[derive(Debug, Clone)]
pub struct CreateTenantDatabaseInput {
    pub tenant_id: u64,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub username: String,
    pub encrypted_password: String,
    pub provisioning_status: TenantDatabaseStatus,
}

/// Everything needed to open a connection to a tenant store
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub charset: String,
    pub collation: String,
    pub strict: bool,
    pub engine: Option<String>,
}

impl ConnectionDescriptor {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            charset: TENANT_CHARSET.to_string(),
            collation: TENANT_COLLATION.to_string(),
            strict: true,
            engine: None,
        }
    }

    /// sqlx connect options for this descriptor
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .charset(&self.charset)
            .collation(&self.collation)
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .finish()
    }
}
