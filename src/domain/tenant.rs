//! Tenant domain model

use super::common::{impl_mysql_string_enum, slugify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// Tenant status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[default]
    Pending,
    Active,
    Suspended,
}

impl std::str::FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TenantStatus::Pending),
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            _ => Err(format!("Unknown tenant status: {}", s)),
        }
    }
}

impl std::fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantStatus::Pending => write!(f, "pending"),
            TenantStatus::Active => write!(f, "active"),
            TenantStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl_mysql_string_enum!(TenantStatus);

/// Progress of the tenant's isolated store.
///
/// `None -> Provisioning -> Provisioned | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvisioningStatus {
    #[default]
    None,
    Provisioning,
    Provisioned,
    Failed,
}

impl std::str::FromStr for DatabaseProvisioningStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            // older rows used "pending" for "not started"
            "none" | "pending" => Ok(DatabaseProvisioningStatus::None),
            "provisioning" => Ok(DatabaseProvisioningStatus::Provisioning),
            "provisioned" => Ok(DatabaseProvisioningStatus::Provisioned),
            "failed" => Ok(DatabaseProvisioningStatus::Failed),
            _ => Err(format!("Unknown provisioning status: {}", s)),
        }
    }
}

impl std::fmt::Display for DatabaseProvisioningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseProvisioningStatus::None => write!(f, "none"),
            DatabaseProvisioningStatus::Provisioning => write!(f, "provisioning"),
            DatabaseProvisioningStatus::Provisioned => write!(f, "provisioned"),
            DatabaseProvisioningStatus::Failed => write!(f, "failed"),
        }
    }
}

impl_mysql_string_enum!(DatabaseProvisioningStatus);

/// Request metadata captured at registration time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationMetadata {
    pub registration_date: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default = "default_registration_source")]
    pub registration_source: String,
}

fn default_registration_source() -> String {
    "web".to_string()
}

/// Tenant entity (central store)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subdomain: String,
    pub status: TenantStatus,
    pub database_provisioning_status: DatabaseProvisioningStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by_id: Option<u64>,
    pub metadata: Option<Json<RegistrationMetadata>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Tenant {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            email: String::new(),
            phone: None,
            subdomain: String::new(),
            status: TenantStatus::default(),
            database_provisioning_status: DatabaseProvisioningStatus::default(),
            approved_at: None,
            approved_by_id: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Tenant {
    /// Name of the tenant's isolated database: `tenant_<id>_<slug>`
    pub fn database_name(&self) -> String {
        format!("tenant_{}_{}", self.id, slugify(&self.subdomain, '_'))
    }

    /// Name of the tenant's database principal: `user_<id>`
    pub fn database_username(&self) -> String {
        format!("user_{}", self.id)
    }

    /// Cache namespace used while this tenant is active
    pub fn cache_prefix(&self) -> String {
        format!("tenant_{}_cache", self.id)
    }

    /// First/last name fragments for the tenant's first administrator
    pub fn admin_name_fragments(&self) -> (String, String) {
        let mut words = self.name.split_whitespace();
        match words.next() {
            None => ("Admin".to_string(), "User".to_string()),
            Some(first) => {
                let last = words.next().unwrap_or(self.name.trim());
                (first.to_string(), last.to_string())
            }
        }
    }

    pub fn is_provisioned(&self) -> bool {
        self.database_provisioning_status == DatabaseProvisioningStatus::Provisioned
    }
}

/// Input for creating a new tenant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 63), custom(function = "validate_subdomain"))]
    pub subdomain: String,
    pub status: TenantStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by_id: Option<u64>,
    pub metadata: Option<RegistrationMetadata>,
}

/// Validate subdomain format (lowercase alphanumeric with hyphens)
fn validate_subdomain(subdomain: &str) -> Result<(), validator::ValidationError> {
    if SUBDOMAIN_REGEX.is_match(subdomain) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_subdomain"))
    }
}

lazy_static::lazy_static! {
    pub static ref SUBDOMAIN_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}
