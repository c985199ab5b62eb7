//! Central and tenant schema migration
//!
//! - `central`: embedded migrations for the central store
//! - `runner`: `.sql` artifacts on disk and the per-store ledger
//! - `migrator`: core and module migration of tenant stores

pub mod central;
pub mod migrator;
pub mod runner;

pub use central::run_central_migrations;
pub use migrator::{
    migration_connection_name, CoreMigrationReport, ModuleMigrationOutcome,
    ModuleMigrationStatus, ProvisioningReport, SchemaMigrator, SchemaReport,
};
pub use runner::{FsSchemaRunner, SchemaRunner};
