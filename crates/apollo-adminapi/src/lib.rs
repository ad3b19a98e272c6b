//! Typed client facades for the Apollo admin service.
//!
//! One [`AdminServiceClient`] is shared by small per-resource facades
//! (applications, namespaces, items, clusters, releases, commits, locks,
//! instances and health). Every call names the target environment; address
//! resolution, retries and failover happen in `apollo-core`.

#![deny(missing_docs)]

pub mod apps;
pub mod client;
pub mod clusters;
pub mod commits;
pub mod health;
pub mod instances;
pub mod items;
pub mod locks;
pub mod models;
pub mod namespaces;
pub mod releases;

pub use apps::AppApi;
pub use client::{AdminServiceClient, AdminServiceClientBuilder};
pub use clusters::ClusterApi;
pub use commits::CommitApi;
pub use health::HealthApi;
pub use instances::InstanceApi;
pub use items::ItemApi;
pub use locks::NamespaceLockApi;
pub use models::{
    App, AppNamespace, AuditFields, Cluster, Commit, Health, HealthStatus, Instance,
    InstanceConfig, Item, ItemChangeSets, Namespace, NamespaceLock, Page, Release,
};
pub use namespaces::NamespaceApi;
pub use releases::ReleaseApi;

/// Convenient result alias that reuses the shared admin service error type.
pub type Result<T> = apollo_core::Result<T>;
