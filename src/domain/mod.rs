//! Domain models

pub mod common;
pub mod tenant;
pub mod tenant_database;
pub mod user;

pub use common::slugify;
pub use tenant::{
    CreateTenantInput, DatabaseProvisioningStatus, RegistrationMetadata, Tenant, TenantStatus,
};
pub use tenant_database::{
    ConnectionDescriptor, CreateTenantDatabaseInput, TenantDatabase, TenantDatabaseStatus,
    TENANT_CHARSET, TENANT_COLLATION,
};
pub use user::{next_tenant_code, CentralUser, CreateCentralUserInput, RegisterTenantInput};
