//! Tenant context switching

pub mod registry;
pub mod tenant_context;

pub use registry::{ConnectionRegistry, DefaultGuard, CENTRAL_CONNECTION, TENANT_CONNECTION};
pub use tenant_context::{ScopedFuture, StorageDisk, TenantContext, Visibility};
