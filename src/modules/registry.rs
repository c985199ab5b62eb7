//! Discovery of active feature modules

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Source of the active module list, in discovery order
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
    async fn active_modules(&self) -> Result<Vec<String>>;
}

/// Reads a JSON object of `"Module": true|false` flags.
///
/// File order is the discovery order. A missing file means no active modules.
pub struct StatusFileModuleRegistry {
    path: PathBuf,
}

impl StatusFileModuleRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModuleRegistry for StatusFileModuleRegistry {
    async fn active_modules(&self) -> Result<Vec<String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Module status file not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let statuses: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| {
                AppError::Validation(format!(
                    "Invalid module status file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        Ok(statuses
            .into_iter()
            .filter(|(_, enabled)| enabled.as_bool().unwrap_or(false))
            .map(|(name, _)| name)
            .collect())
    }
}
