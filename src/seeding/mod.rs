//! Initial data for tenant stores

pub mod bootstrap;
pub mod orchestrator;
pub mod seeder;

pub use bootstrap::{AdminUserSeeder, BootstrapAdmin, BootstrapSeeder};
pub use orchestrator::{SeedOrchestrator, SeedReport};
pub use seeder::{Seeder, SeederRegistry, SqlFileSeeder};
