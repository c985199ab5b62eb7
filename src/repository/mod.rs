//! Data access layer for the central store (Repository pattern)

pub mod tenant;
pub mod tenant_database;
pub mod user;

pub use tenant::{TenantRepository, TenantRepositoryImpl};
pub use tenant_database::{TenantDatabaseRepository, TenantDatabaseRepositoryImpl};
pub use user::{CentralUserRepository, CentralUserRepositoryImpl};
