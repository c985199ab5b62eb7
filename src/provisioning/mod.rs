//! Tenant store provisioning

pub mod admin;
pub mod provisioner;

pub use admin::{DatabaseAdmin, MySqlDatabaseAdmin};
pub use provisioner::{
    generate_password, ConnectionTestResult, ProvisionResult, TenantProvisioner, PASSWORD_LENGTH,
};
