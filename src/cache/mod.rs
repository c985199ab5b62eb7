//! Redis cache layer, namespaced by the active tenant

use crate::config::RedisConfig;
use crate::context::TenantContext;
use crate::error::{AppError, Result};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Full Redis key for `key` under `prefix`
pub fn namespaced_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

/// Cache whose keys follow the context's cache prefix, so one tenant can
/// never read another tenant's entries.
#[derive(Clone)]
pub struct TenantCache {
    conn: ConnectionManager,
}

impl TenantCache {
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &TenantContext,
        key: &str,
    ) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(namespaced_key(ctx.cache_prefix(), key)).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn put<T: Serialize>(
        &self,
        ctx: &TenantContext,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize error: {}", e)))?;

        let _: () = conn
            .set_ex(namespaced_key(ctx.cache_prefix(), key), serialized, ttl.as_secs())
            .await?;
        Ok(())
    }

    pub async fn forget(&self, ctx: &TenantContext, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(namespaced_key(ctx.cache_prefix(), key)).await?;
        Ok(())
    }

    /// Drop every entry under `prefix`. An empty prefix is refused.
    pub async fn flush_namespace(&self, prefix: &str) -> Result<usize> {
        if prefix.is_empty() {
            return Err(AppError::Validation(
                "Refusing to flush an unprefixed cache namespace".to_string(),
            ));
        }

        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(format!("{}:*", prefix))
            .query_async(&mut conn)
            .await?;

        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await?;
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_key() {
        assert_eq!(namespaced_key("tenant_5_cache", "settings"), "tenant_5_cache:settings");
        assert_eq!(namespaced_key("", "settings"), "settings");
    }

    #[test]
    fn test_tenants_never_share_keys() {
        assert_ne!(
            namespaced_key("tenant_1_cache", "settings"),
            namespaced_key("tenant_2_cache", "settings")
        );
    }
}
