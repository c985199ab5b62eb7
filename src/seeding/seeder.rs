//! Named seeders and their resolution

use crate::error::{AppError, Result};
use crate::migration::runner::execute_file;
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A data set that can be loaded into a tenant store
#[async_trait]
pub trait Seeder: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, pool: &MySqlPool) -> Result<()>;
}

/// Seeder backed by a `.sql` file
pub struct SqlFileSeeder {
    name: String,
    path: PathBuf,
}

impl SqlFileSeeder {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl Seeder for SqlFileSeeder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, pool: &MySqlPool) -> Result<()> {
        execute_file(pool, &self.path)
            .await
            .map_err(|e| AppError::Seed(format!("{}: {}", self.name, e)))
    }
}

/// Resolves seeder identifiers to runnable seeders.
///
/// In-process registrations win over `<seeders_path>/<Name>.sql` files.
/// Identifiers may be namespaced (`Database\Seeders\RoleSeeder`,
/// `seeders::RoleSeeder`); only the last segment is used for file lookup.
pub struct SeederRegistry {
    seeders_path: PathBuf,
    registered: HashMap<String, Arc<dyn Seeder>>,
}

impl SeederRegistry {
    pub fn new(seeders_path: impl Into<PathBuf>) -> Self {
        Self {
            seeders_path: seeders_path.into(),
            registered: HashMap::new(),
        }
    }

    pub fn register(&mut self, seeder: Arc<dyn Seeder>) {
        self.registered.insert(seeder.name().to_string(), seeder);
    }

    pub fn with(mut self, seeder: Arc<dyn Seeder>) -> Self {
        self.register(seeder);
        self
    }

    pub fn resolve(&self, identifier: &str) -> Option<Arc<dyn Seeder>> {
        if let Some(seeder) = self.registered.get(identifier) {
            return Some(seeder.clone());
        }

        let short = short_name(identifier);
        if let Some(seeder) = self.registered.get(short) {
            return Some(seeder.clone());
        }

        let path = self.seeders_path.join(format!("{}.sql", short));
        if short.is_empty() || !path.is_file() {
            return None;
        }
        Some(Arc::new(SqlFileSeeder::new(identifier, path)))
    }
}

fn short_name(identifier: &str) -> &str {
    identifier
        .rsplit(|c| c == '\\' || c == ':' || c == '/')
        .next()
        .unwrap_or(identifier)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedSeeder(&'static str);

    #[async_trait]
    impl Seeder for NamedSeeder {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _pool: &MySqlPool) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name(r"Database\Seeders\RoleSeeder"), "RoleSeeder");
        assert_eq!(short_name("seeders::RoleSeeder"), "RoleSeeder");
        assert_eq!(short_name("RoleSeeder"), "RoleSeeder");
    }

    #[test]
    fn test_resolve_registered_before_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("RoleSeeder.sql"), "SELECT 1;").unwrap();

        let registry = SeederRegistry::new(dir.path()).with(Arc::new(NamedSeeder("RoleSeeder")));

        let resolved = registry.resolve(r"Database\Seeders\RoleSeeder").unwrap();
        assert_eq!(resolved.name(), "RoleSeeder");
    }

    #[test]
    fn test_resolve_sql_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LeaveTypeSeeder.sql"), "SELECT 1;").unwrap();

        let registry = SeederRegistry::new(dir.path());
        let resolved = registry.resolve(r"Database\Seeders\LeaveTypeSeeder").unwrap();
        assert_eq!(resolved.name(), r"Database\Seeders\LeaveTypeSeeder");
        assert!(registry.resolve("HolidaySeeder").is_none());
        assert!(registry.resolve("").is_none());
    }
}
