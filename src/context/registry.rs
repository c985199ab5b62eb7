//! Named database connections and the default-connection slot

use crate::domain::ConnectionDescriptor;
use crate::error::{AppError, Result};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Name of the central store connection
pub const CENTRAL_CONNECTION: &str = "mysql";
/// Slot holding the active tenant's connection
pub const TENANT_CONNECTION: &str = "tenant";

#[derive(Clone)]
enum ConnectionTarget {
    /// A pool owned elsewhere (the central pool). Purging never closes it.
    Shared(MySqlPool),
    /// Built lazily from a descriptor on first use
    Descriptor(ConnectionDescriptor),
}

/// Per-unit-of-work table of named connections.
///
/// Targets describe how to reach a store; handles are the pools opened for
/// them. `purge` drops a handle, `reconnect` opens a fresh one.
pub struct ConnectionRegistry {
    targets: HashMap<String, ConnectionTarget>,
    handles: HashMap<String, MySqlPool>,
    default: String,
    max_connections: u32,
}

impl ConnectionRegistry {
    /// Registry whose default is the central pool
    pub fn new(central: MySqlPool) -> Self {
        let mut targets = HashMap::new();
        targets.insert(
            CENTRAL_CONNECTION.to_string(),
            ConnectionTarget::Shared(central),
        );
        Self {
            targets,
            handles: HashMap::new(),
            default: CENTRAL_CONNECTION.to_string(),
            max_connections: 5,
        }
    }

    /// Pool size for descriptor-backed connections
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn register_pool(&mut self, name: impl Into<String>, pool: MySqlPool) {
        let name = name.into();
        self.handles.remove(&name);
        self.targets.insert(name, ConnectionTarget::Shared(pool));
    }

    /// Install or refresh a descriptor-backed connection. Any open handle is dropped.
    pub fn configure(&mut self, name: impl Into<String>, descriptor: ConnectionDescriptor) {
        let name = name.into();
        self.handles.remove(&name);
        self.targets
            .insert(name, ConnectionTarget::Descriptor(descriptor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ConnectionDescriptor> {
        match self.targets.get(name) {
            Some(ConnectionTarget::Descriptor(d)) => Some(d),
            _ => None,
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = name.into();
    }

    /// Whether a handle is currently open for `name`
    pub fn is_connected(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Handle for `name`, opening one if needed
    pub fn pool(&mut self, name: &str) -> Result<MySqlPool> {
        if let Some(pool) = self.handles.get(name) {
            return Ok(pool.clone());
        }

        let pool = match self.targets.get(name) {
            Some(ConnectionTarget::Shared(pool)) => pool.clone(),
            Some(ConnectionTarget::Descriptor(descriptor)) => MySqlPoolOptions::new()
                .max_connections(self.max_connections)
                .connect_lazy_with(descriptor.connect_options()),
            None => {
                return Err(AppError::NotConfigured(format!(
                    "Database connection [{}] not configured",
                    name
                )))
            }
        };

        self.handles.insert(name.to_string(), pool.clone());
        Ok(pool)
    }

    pub fn default_pool(&mut self) -> Result<MySqlPool> {
        let name = self.default.clone();
        self.pool(&name)
    }

    /// Forget the open handle for `name`. The target stays registered.
    pub fn purge(&mut self, name: &str) {
        self.handles.remove(name);
    }

    pub fn reconnect(&mut self, name: &str) -> Result<()> {
        self.purge(name);
        self.pool(name).map(|_| ())
    }

    /// Make `name` the default until the guard drops, then restore the current default
    pub fn scoped_default(&mut self, name: impl Into<String>) -> DefaultGuard<'_> {
        let previous = std::mem::replace(&mut self.default, name.into());
        DefaultGuard {
            registry: self,
            restore_to: previous,
        }
    }

    /// Set the default to `name` when the guard drops, whatever happens in between
    pub fn restore_default_on_drop(&mut self, name: impl Into<String>) -> DefaultGuard<'_> {
        DefaultGuard {
            registry: self,
            restore_to: name.into(),
        }
    }
}

/// Restores the registry's default connection on drop
pub struct DefaultGuard<'a> {
    registry: &'a mut ConnectionRegistry,
    restore_to: String,
}

impl Deref for DefaultGuard<'_> {
    type Target = ConnectionRegistry;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl DerefMut for DefaultGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl Drop for DefaultGuard<'_> {
    fn drop(&mut self) {
        self.registry.default = std::mem::take(&mut self.restore_to);
    }
}
