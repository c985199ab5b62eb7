//! Schema and seed artifacts on disk, tracked by a per-store ledger

use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MIGRATION_DIRS: [&str; 2] = ["database/migrations", "Database/Migrations"];
const SEEDER_DIRS: [&str; 2] = ["database/seeders", "Database/Seeders"];

/// Applies schema and seed artifacts to one store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaRunner: Send + Sync {
    /// Create the migration ledger if missing
    async fn install_ledger(&self, pool: &MySqlPool) -> Result<()>;
    /// Core migration names, in application order
    async fn core_migrations(&self) -> Result<Vec<String>>;
    /// Apply one core migration; `false` when the ledger already has it
    async fn apply_core(&self, pool: &MySqlPool, migration: &str) -> Result<bool>;
    /// Apply a module's pending migrations, returning how many ran
    async fn apply_module(&self, pool: &MySqlPool, module: &str) -> Result<usize>;
    async fn module_has_seeds(&self, module: &str) -> bool;
    async fn seed_module(&self, pool: &MySqlPool, module: &str) -> Result<()>;
}

/// [`SchemaRunner`] over directories of `.sql` files
pub struct FsSchemaRunner {
    core_path: PathBuf,
    modules_path: PathBuf,
}

impl FsSchemaRunner {
    pub fn new(core_path: impl Into<PathBuf>, modules_path: impl Into<PathBuf>) -> Self {
        Self {
            core_path: core_path.into(),
            modules_path: modules_path.into(),
        }
    }

    fn module_dir(&self, module: &str, candidates: &[&str]) -> Option<PathBuf> {
        candidates
            .iter()
            .map(|dir| self.modules_path.join(module).join(dir))
            .find(|path| path.is_dir())
    }

    async fn applied(&self, pool: &MySqlPool) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT migration FROM migrations")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(m,)| m).collect())
    }

    async fn next_batch(&self, pool: &MySqlPool) -> Result<i64> {
        let (batch,): (i64,) =
            sqlx::query_as("SELECT CAST(COALESCE(MAX(batch), 0) + 1 AS SIGNED) FROM migrations")
                .fetch_one(pool)
                .await?;
        Ok(batch)
    }

    async fn run_migration(
        &self,
        pool: &MySqlPool,
        name: &str,
        path: &Path,
        batch: i64,
    ) -> Result<()> {
        execute_file(pool, path)
            .await
            .map_err(|e| AppError::Migration(format!("{}: {}", name, e)))?;

        sqlx::query("INSERT INTO migrations (migration, batch) VALUES (?, ?)")
            .bind(name)
            .bind(batch)
            .execute(pool)
            .await?;

        debug!(migration = name, batch, "Migration applied");
        Ok(())
    }
}

/// `.sql` files in `dir`, sorted by file name. A missing directory is empty.
async fn sql_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn migration_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run every statement of a `.sql` file
pub(crate) async fn execute_file(pool: &MySqlPool, path: &Path) -> Result<()> {
    let sql = tokio::fs::read_to_string(path).await?;
    if sql.trim().is_empty() {
        return Ok(());
    }
    sqlx::raw_sql(&sql).execute(pool).await?;
    Ok(())
}

#[async_trait]
impl SchemaRunner for FsSchemaRunner {
    async fn install_ledger(&self, pool: &MySqlPool) -> Result<()> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                id INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                migration VARCHAR(255) NOT NULL,
                batch INT NOT NULL
            ) DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn core_migrations(&self) -> Result<Vec<String>> {
        let files = sql_files(&self.core_path).await?;
        Ok(files.iter().map(|p| migration_name(p)).collect())
    }

    async fn apply_core(&self, pool: &MySqlPool, migration: &str) -> Result<bool> {
        if self.applied(pool).await?.contains(migration) {
            return Ok(false);
        }

        let path = self.core_path.join(format!("{}.sql", migration));
        let batch = self.next_batch(pool).await?;
        self.run_migration(pool, migration, &path, batch).await?;
        Ok(true)
    }

    async fn apply_module(&self, pool: &MySqlPool, module: &str) -> Result<usize> {
        let Some(dir) = self.module_dir(module, &MIGRATION_DIRS) else {
            debug!(module, "Module ships no migrations");
            return Ok(0);
        };

        let applied = self.applied(pool).await?;
        let pending: Vec<PathBuf> = sql_files(&dir)
            .await?
            .into_iter()
            .filter(|p| !applied.contains(&migration_name(p)))
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let batch = self.next_batch(pool).await?;
        for path in &pending {
            self.run_migration(pool, &migration_name(path), path, batch)
                .await?;
        }

        info!(module, count = pending.len(), "Module migrations applied");
        Ok(pending.len())
    }

    async fn module_has_seeds(&self, module: &str) -> bool {
        match self.module_dir(module, &SEEDER_DIRS) {
            Some(dir) => sql_files(&dir)
                .await
                .map(|files| !files.is_empty())
                .unwrap_or(false),
            None => false,
        }
    }

    async fn seed_module(&self, pool: &MySqlPool, module: &str) -> Result<()> {
        let Some(dir) = self.module_dir(module, &SEEDER_DIRS) else {
            return Ok(());
        };

        for path in sql_files(&dir).await? {
            execute_file(pool, &path).await.map_err(|e| {
                AppError::Seed(format!("{}/{}: {}", module, migration_name(&path), e))
            })?;
        }
        Ok(())
    }
}
