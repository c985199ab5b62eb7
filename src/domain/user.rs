//! Central registration user (the tenant owner)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CentralUser {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Password hash, never a clear-text password
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub code: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for CentralUser {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: None,
            password: None,
            code: None,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating the central owner account
#[derive(Debug, Clone)]
pub struct CreateCentralUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub code: String,
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// Self-service registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterTenantInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    /// Derived from the company name when absent
    pub subdomain: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub source: Option<String>,
}

/// Next sequential owner code after `last` (`TENANT-001`, `TENANT-002`, ...)
pub fn next_tenant_code(last: Option<&str>) -> String {
    let next = last
        .and_then(|code| code.strip_prefix("TENANT-"))
        .and_then(|n| n.parse::<u32>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("TENANT-{:03}", next)
}
