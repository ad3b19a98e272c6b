//! Admin service transfer records.
//!
//! Records are passed through unmodified: field names are camelCase on the
//! wire, unknown fields are ignored and audit fields are optional.

use std::collections::BTreeMap;

use apollo_core::ids::{ClusterId, InstanceId, ItemId, NamespaceId, ReleaseId};
use apollo_core::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Audit columns carried by most admin service records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    /// User that created the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_change_created_by: Option<String>,
    /// User that last modified the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_change_last_modified_by: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "audit_time")]
    pub data_change_created_time: Option<NaiveDateTime>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "audit_time")]
    pub data_change_last_modified_time: Option<NaiveDateTime>,
}

/// An application registered with the admin service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Application id.
    pub app_id: String,
    /// Display name.
    pub name: String,
    /// Owning organization id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// Owning organization name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    /// Owner user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Owner email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl App {
    /// Create an app record with the mandatory fields set.
    #[must_use]
    pub fn new(app_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Namespace definition at application level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppNamespace {
    /// Namespace name.
    pub name: String,
    /// Owning application id.
    pub app_id: String,
    /// Content format, `properties` unless stated otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Whether other applications may associate this namespace.
    #[serde(default)]
    pub is_public: bool,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

/// A cluster of an application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster id, assigned by the admin service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClusterId>,
    /// Cluster name.
    pub name: String,
    /// Owning application id.
    pub app_id: String,
    /// Parent cluster for branch clusters, `0` for top-level clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_cluster_id: Option<ClusterId>,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Cluster {
    /// Returns true if this cluster is a branch of another cluster.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.parent_cluster_id.is_some_and(|id| id.get() > 0)
    }
}

/// A namespace instantiated in one cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Namespace id, assigned by the admin service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NamespaceId>,
    /// Owning application id.
    pub app_id: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Namespace name.
    pub namespace_name: String,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

/// A configuration item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item id, assigned by the admin service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    /// Namespace the item belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<NamespaceId>,
    /// Item key. Empty for comment and blank lines.
    #[serde(default)]
    pub key: String,
    /// Item value.
    #[serde(default)]
    pub value: String,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Position within the namespace text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_num: Option<i32>,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Item {
    /// Create a key/value item.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Batched item changes applied in one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemChangeSets {
    /// Items to create.
    #[serde(default)]
    pub create_items: Vec<Item>,
    /// Items to update.
    #[serde(default)]
    pub update_items: Vec<Item>,
    /// Items to delete.
    #[serde(default)]
    pub delete_items: Vec<Item>,
    /// Operator applying the change set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_change_last_modified_by: Option<String>,
}

impl ItemChangeSets {
    /// Create an empty change set attributed to `operator`.
    #[must_use]
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            data_change_last_modified_by: Some(operator.into()),
            ..Self::default()
        }
    }

    /// Add an item to create.
    #[must_use]
    pub fn with_create_item(mut self, item: Item) -> Self {
        self.create_items.push(item);
        self
    }

    /// Add an item to update.
    #[must_use]
    pub fn with_update_item(mut self, item: Item) -> Self {
        self.update_items.push(item);
        self
    }

    /// Add an item to delete.
    #[must_use]
    pub fn with_delete_item(mut self, item: Item) -> Self {
        self.delete_items.push(item);
        self
    }

    /// Returns true if the change set carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create_items.is_empty() && self.update_items.is_empty() && self.delete_items.is_empty()
    }
}

/// A published snapshot of a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Release id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReleaseId>,
    /// Release key used by clients to detect changes.
    #[serde(default)]
    pub release_key: String,
    /// Release title.
    #[serde(default)]
    pub name: String,
    /// Owning application id.
    pub app_id: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Namespace name.
    pub namespace_name: String,
    /// Released configuration as a JSON object encoded in a string.
    #[serde(default)]
    pub configurations: String,
    /// Release comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Whether the release has been rolled back.
    #[serde(default)]
    pub is_abandoned: bool,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Release {
    /// Decode [`Release::configurations`] into key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`apollo_core::Error::ParseError`] if the string is not a JSON
    /// object of strings.
    pub fn configuration_map(&self) -> Result<BTreeMap<String, String>> {
        if self.configurations.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&self.configurations)?)
    }
}

/// A commit recorded against a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Change sets as a JSON document encoded in a string.
    #[serde(default)]
    pub change_sets: String,
    /// Owning application id.
    pub app_id: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Namespace name.
    pub namespace_name: String,
    /// Commit comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

/// Edit lock held on a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceLock {
    /// Locked namespace.
    pub namespace_id: NamespaceId,
    /// Audit fields. The creator is the lock holder.
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl NamespaceLock {
    /// Returns the user holding the lock.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.audit.data_change_created_by.as_deref()
    }
}

/// A release as consumed by one instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    /// Release in use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,
    /// When the release was delivered to the instance.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "audit_time")]
    pub release_delivery_time: Option<NaiveDateTime>,
    /// When the instance last reported this release.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "audit_time")]
    pub data_change_last_modified_time: Option<NaiveDateTime>,
}

/// A running process consuming configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Instance id.
    pub id: InstanceId,
    /// Application id.
    pub app_id: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Data center the instance reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center: Option<String>,
    /// Instance IP address.
    pub ip: String,
    /// Releases the instance consumes.
    #[serde(default)]
    pub configs: Vec<InstanceConfig>,
    /// Audit fields.
    #[serde(flatten)]
    pub audit: AuditFields,
}

/// One page of results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Zero-based page number.
    #[serde(default)]
    pub page: u32,
    /// Requested page size.
    #[serde(default)]
    pub size: u32,
    /// Total number of elements across all pages.
    #[serde(default)]
    pub total: u64,
    /// Elements on this page.
    #[serde(default)]
    pub content: Vec<T>,
}

impl<T> Page<T> {
    /// Returns true if the page holds any element.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Reported health state.
///
/// Unrecognized states are kept verbatim in [`HealthStatus::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthStatus {
    /// Service is up
    Up,
    /// Service is down
    Down,
    /// Service is out of rotation
    OutOfService,
    /// State is unknown
    #[default]
    Unknown,
    /// Any other state, as reported
    Other(String),
}

impl HealthStatus {
    /// Wire form of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::OutOfService => "OUT_OF_SERVICE",
            Self::Unknown => "UNKNOWN",
            Self::Other(status) => status,
        }
    }
}

impl From<String> for HealthStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "OUT_OF_SERVICE" => Self::OutOfService,
            "UNKNOWN" => Self::Unknown,
            _ => Self::Other(status),
        }
    }
}

impl From<HealthStatus> for String {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health report of an admin service.
///
/// Every field other than `status` is kept in `details` as sent, whether the
/// service reports components at the top level or nests them under
/// `details`/`components`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Health {
    /// Overall status.
    #[serde(default)]
    pub status: HealthStatus,
    /// Remaining fields of the report.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Health {
    /// Returns true if the service reports `UP`.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }

    /// Look up a component report by name.
    ///
    /// Top-level fields are checked first, then the nested `details` and
    /// `components` objects.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&serde_json::Value> {
        self.details.get(name).or_else(|| {
            ["details", "components"]
                .iter()
                .filter_map(|key| self.details.get(*key)?.as_object())
                .find_map(|nested| nested.get(name))
        })
    }
}

/// Error body returned by the admin service on failure.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AdminErrorBody {
    /// HTTP status echoed by the service.
    #[serde(default)]
    pub status: Option<u16>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Server-side exception class.
    #[serde(default)]
    pub exception: Option<String>,
    /// Server-side timestamp.
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// Audit timestamps: written as `yyyy-MM-ddTHH:mm:ss.SSS`, read with or
/// without a trailing UTC offset. The offset is dropped, keeping wall time.
mod audit_time {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).ok_or_else(|| {
            de::Error::custom(format!("invalid audit timestamp `{raw}`"))
        })
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|time| time.naive_local())
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z").map(|time| time.naive_local()))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
    }
}
