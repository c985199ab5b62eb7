//! Tenancy Core - tenant provisioning and context switching
//!
//! This crate creates an isolated MySQL store per tenant, brings it to the
//! current schema, seeds its first administrator and lets application code
//! run scoped work against a tenant or the central store.

pub mod cache;
pub mod config;
pub mod context;
pub mod credentials;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod migration;
pub mod modules;
pub mod provisioning;
pub mod repository;
pub mod seeding;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
