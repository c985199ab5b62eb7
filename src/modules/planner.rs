//! Module migration planning

use super::registry::ModuleRegistry;
use crate::config::TenantModulesConfig;
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Partition of the active modules for one migration run. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModulePlan {
    /// Active priority modules, in configured order
    pub priority: Vec<String>,
    /// Active modules that never reach a tenant store
    pub excluded: Vec<String>,
    /// Everything else, in discovery order
    pub remaining: Vec<String>,
}

impl ModulePlan {
    pub fn build(active: &[String], excluded: &[String], priority: &[String]) -> Self {
        let is_active = |m: &String| active.contains(m);

        let excluded: Vec<String> = excluded.iter().filter(|m| is_active(m)).cloned().collect();
        // Exclusion wins over priority
        let priority: Vec<String> = priority
            .iter()
            .filter(|m| is_active(m) && !excluded.contains(m))
            .cloned()
            .collect();
        let remaining = active
            .iter()
            .filter(|m| !excluded.contains(m) && !priority.contains(m))
            .cloned()
            .collect();

        Self {
            priority,
            excluded,
            remaining,
        }
    }

    /// Priority modules first, then the remaining ones
    pub fn migration_order(&self) -> impl Iterator<Item = &str> {
        self.priority
            .iter()
            .chain(self.remaining.iter())
            .map(String::as_str)
    }

    pub fn is_excluded(&self, module: &str) -> bool {
        self.excluded.iter().any(|m| m == module)
    }
}

pub struct ModulePlanner {
    registry: Arc<dyn ModuleRegistry>,
    excluded: Vec<String>,
    priority: Vec<String>,
}

impl ModulePlanner {
    pub fn new(
        registry: Arc<dyn ModuleRegistry>,
        excluded: Vec<String>,
        priority: Vec<String>,
    ) -> Self {
        Self {
            registry,
            excluded,
            priority,
        }
    }

    pub fn from_config(registry: Arc<dyn ModuleRegistry>, config: &TenantModulesConfig) -> Self {
        Self::new(
            registry,
            config.excluded_modules.clone(),
            config.priority_modules.clone(),
        )
    }

    /// Build a fresh plan from the registry's current state
    pub async fn plan(&self) -> Result<ModulePlan> {
        let active = self.registry.active_modules().await?;
        Ok(ModulePlan::build(&active, &self.excluded, &self.priority))
    }
}
