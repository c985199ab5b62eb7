//! Tenant data-store credentials
//!
//! Seals passwords with the platform key before they are persisted and turns
//! a stored credentials row back into a [`ConnectionDescriptor`].

use crate::crypto::{self, EncryptionKey};
use crate::domain::{
    ConnectionDescriptor, CreateTenantDatabaseInput, Tenant, TenantDatabase,
    TenantDatabaseStatus,
};
use crate::error::{AppError, Result};
use crate::repository::TenantDatabaseRepository;
use std::sync::Arc;

/// Plain-text credentials for a freshly provisioned store
#[derive(Clone)]
pub struct NewCredentials {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub username: String,
    pub password: String,
}

pub struct CredentialStore {
    repo: Arc<dyn TenantDatabaseRepository>,
    key: EncryptionKey,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn TenantDatabaseRepository>, key: EncryptionKey) -> Self {
        Self { repo, key }
    }

    pub fn seal(&self, password: &str) -> Result<String> {
        crypto::encrypt(&self.key, password).map_err(|e| AppError::Internal(e.into()))
    }

    /// Decryption failures surface as [`AppError::Decryption`]
    pub fn open(&self, encrypted: &str) -> Result<String> {
        Ok(crypto::decrypt(&self.key, encrypted)?)
    }

    pub async fn find(&self, tenant_id: u64) -> Result<Option<TenantDatabase>> {
        self.repo.find_by_tenant(tenant_id).await
    }

    /// Persist a provisioned credentials row
    pub async fn save(&self, tenant_id: u64, creds: &NewCredentials) -> Result<TenantDatabase> {
        let input = CreateTenantDatabaseInput {
            tenant_id,
            host: creds.host.clone(),
            port: creds.port,
            database_name: creds.database_name.clone(),
            username: creds.username.clone(),
            encrypted_password: self.seal(&creds.password)?,
            provisioning_status: TenantDatabaseStatus::Provisioned,
        };
        self.repo.create(&input).await
    }

    pub async fn remove(&self, record: &TenantDatabase) -> Result<()> {
        self.repo.delete(record.id).await
    }

    pub async fn mark_verified(&self, record: &TenantDatabase) -> Result<()> {
        self.repo.touch_verified(record.id).await
    }

    /// Descriptor for a stored credentials row
    pub fn descriptor_for(&self, record: &TenantDatabase) -> Result<ConnectionDescriptor> {
        let password = self.open(&record.encrypted_password)?;
        Ok(ConnectionDescriptor::new(
            record.host.clone(),
            record.port,
            record.database_name.clone(),
            record.username.clone(),
            password,
        ))
    }

    /// Descriptor for a tenant's store, `NotConfigured` when none was provisioned
    pub async fn connection_descriptor(&self, tenant: &Tenant) -> Result<ConnectionDescriptor> {
        let record = self.repo.find_by_tenant(tenant.id).await?.ok_or_else(|| {
            AppError::NotConfigured(format!(
                "Tenant database not configured for tenant {}",
                tenant.id
            ))
        })?;
        self.descriptor_for(&record)
    }
}
