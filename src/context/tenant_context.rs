//! The active-tenant switch for one unit of work

use super::registry::{ConnectionRegistry, CENTRAL_CONNECTION, TENANT_CONNECTION};
use crate::config::StorageConfig;
use crate::credentials::CredentialStore;
use crate::domain::Tenant;
use crate::error::Result;
use sqlx::MySqlPool;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Future returned by closures run inside [`TenantContext::for_tenant`] and
/// [`TenantContext::for_central`]
pub type ScopedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Local disk the active tenant's files live on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDisk {
    pub root: PathBuf,
    pub url: String,
    pub visibility: Visibility,
}

/// Which tenant is active, and where its data lives.
///
/// Owned by a single request or task. Switching redirects the default
/// connection, the cache prefix and the tenant storage disk together.
pub struct TenantContext {
    connections: ConnectionRegistry,
    credentials: Arc<CredentialStore>,
    storage: StorageConfig,
    current: Option<Tenant>,
    /// Captured by the first switch and never overwritten afterwards
    original_connection: Option<String>,
    cache_prefix: String,
    tenant_disk: Option<StorageDisk>,
}

impl TenantContext {
    pub fn new(
        connections: ConnectionRegistry,
        credentials: Arc<CredentialStore>,
        storage: StorageConfig,
    ) -> Self {
        let cache_prefix = storage.cache_prefix.clone();
        Self {
            connections,
            credentials,
            storage,
            current: None,
            original_connection: None,
            cache_prefix,
            tenant_disk: None,
        }
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        self.current.as_ref()
    }

    pub fn set_tenant(&mut self, tenant: Option<Tenant>) {
        self.current = tenant;
    }

    pub fn is_tenant_context(&self) -> bool {
        self.current.is_some()
    }

    pub fn cache_prefix(&self) -> &str {
        &self.cache_prefix
    }

    /// Storage disk of the active tenant, if one is switched in
    pub fn tenant_disk(&self) -> Option<&StorageDisk> {
        self.tenant_disk.as_ref()
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.connections
    }

    /// Pool behind the current default connection
    pub fn default_pool(&mut self) -> Result<MySqlPool> {
        self.connections.default_pool()
    }

    /// Point the default connection back at the connection active before
    /// the first switch of this context.
    ///
    /// The current tenant slot is left untouched.
    pub fn switch_to_central(&mut self) -> Result<()> {
        if self.original_connection.is_none() {
            self.original_connection = Some(self.connections.default_name().to_string());
        }

        let target = self
            .original_connection
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| CENTRAL_CONNECTION.to_string());

        self.connections.set_default(target.clone());
        self.cache_prefix = self.storage.cache_prefix.clone();
        self.tenant_disk = None;

        self.connections.purge(TENANT_CONNECTION);
        self.connections.reconnect(&target)?;

        debug!(connection = %target, "Switched to central context");
        Ok(())
    }

    /// Redirect the default connection, cache prefix and storage disk to `tenant`.
    ///
    /// Fails with `NotConfigured` before changing anything when the tenant has
    /// no provisioned store.
    pub async fn switch_to_tenant(&mut self, tenant: &Tenant) -> Result<()> {
        let previous_default = self.connections.default_name().to_string();
        if self.original_connection.is_none() {
            self.original_connection = Some(previous_default.clone());
        }

        let descriptor = self.credentials.connection_descriptor(tenant).await?;
        let disk = self.prepare_tenant_disk(tenant).await?;

        self.connections.configure(TENANT_CONNECTION, descriptor);
        self.connections.set_default(TENANT_CONNECTION);
        self.cache_prefix = tenant.cache_prefix();
        self.tenant_disk = Some(disk);

        // A stale handle on the old default must not keep serving queries.
        if previous_default != TENANT_CONNECTION {
            self.connections.purge(&previous_default);
        }
        self.connections.purge(TENANT_CONNECTION);
        self.connections.reconnect(TENANT_CONNECTION)?;

        self.current = Some(tenant.clone());
        debug!(tenant_id = tenant.id, "Switched to tenant context");
        Ok(())
    }

    async fn prepare_tenant_disk(&self, tenant: &Tenant) -> Result<StorageDisk> {
        let root = self
            .storage
            .root
            .join("app")
            .join("tenants")
            .join(tenant.id.to_string());
        tokio::fs::create_dir_all(&root).await?;

        Ok(StorageDisk {
            root,
            url: format!(
                "{}/storage/tenants/{}",
                self.storage.app_url.trim_end_matches('/'),
                tenant.id
            ),
            visibility: Visibility::Private,
        })
    }

    /// Run `f` with `tenant` active, then restore whatever was active before,
    /// whether `f` succeeded or not.
    pub async fn for_tenant<T, F>(&mut self, tenant: &Tenant, f: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut TenantContext) -> ScopedFuture<'c, T> + Send,
    {
        let previous = self.current.clone();

        let outcome = match self.switch_to_tenant(tenant).await {
            Ok(()) => f(self).await,
            Err(e) => Err(e),
        };

        let restored = match previous {
            Some(previous) => self.switch_to_tenant(&previous).await,
            None => {
                let restored = self.switch_to_central();
                self.current = None;
                restored
            }
        };

        settle(outcome, restored)
    }

    /// Run `f` against the central store with no tenant active, then switch
    /// back to the previously active tenant, if any.
    pub async fn for_central<T, F>(&mut self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut TenantContext) -> ScopedFuture<'c, T> + Send,
    {
        let previous = self.current.clone();

        let outcome = match self.switch_to_central() {
            Ok(()) => {
                self.current = None;
                f(self).await
            }
            Err(e) => Err(e),
        };

        let restored = match previous {
            Some(previous) => self.switch_to_tenant(&previous).await,
            None => Ok(()),
        };

        settle(outcome, restored)
    }
}

/// The closure's error wins over a restore error
fn settle<T>(outcome: Result<T>, restored: Result<()>) -> Result<T> {
    match (outcome, restored) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
    }
}
