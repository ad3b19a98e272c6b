//! # apollo-core
//!
//! Core types and the environment-aware HTTP client used by the Apollo portal
//! to talk to each environment's admin service.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`types`] - Deployment environments
//! - [`ids`] - Strongly-typed numeric identifiers
//! - [`config`] - Portal client configuration
//! - [`client`] - HTTP client, retry and failover
//! - [`services`] - Admin service address resolution and meta server discovery
//! - [`template`] - Path templates with ordered placeholders
//! - [`query`] - Query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod query;
pub mod services;
pub mod template;
pub mod types;

// Re-export commonly used types
pub use client::{ServiceClient, ServiceClientBuilder};
pub use error::{Error, OptionalExt, Result};
pub use types::Env;
