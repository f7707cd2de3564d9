//! Backing-store resource records and object identities.
//!
//! The reconciler never owns these objects; it reads them through the
//! [`ResourceStore`](crate::domain::ports::ResourceStore) port.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of object an agent can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Language model.
    Model,
    /// Runtime that executes the agent.
    ExecutionEngine,
    /// Plain configuration values.
    ConfigMap,
    /// Sensitive configuration values.
    Secret,
    /// Custom tool definition.
    Tool,
    /// MCP server exposing tools.
    McpServer,
}

impl ResourceKind {
    /// Kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::ExecutionEngine => "ExecutionEngine",
            Self::ConfigMap => "ConfigMap",
            Self::Secret => "Secret",
            Self::Tool => "Tool",
            Self::McpServer => "McpServer",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object as returned by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Object kind.
    pub kind: ResourceKind,
    /// Object name.
    pub name: String,
    /// Object namespace.
    pub namespace: String,
    /// Store-assigned unique id.
    #[serde(default = "Uuid::new_v4")]
    pub uid: Uuid,
    /// Object labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// ConfigMap/Secret data, or free-form attributes (e.g. an engine `address`).
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ResourceRecord {
    /// A record with a fresh uid and no labels or data.
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            uid: Uuid::new_v4(),
            labels: BTreeMap::new(),
            data: BTreeMap::new(),
        }
    }

    /// Add a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Identity of this record.
    pub fn identity(&self) -> ObjectIdentity {
        ObjectIdentity {
            kind: self.kind,
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            uid: Some(self.uid),
        }
    }
}

/// Resolved identity of a referenced object.
///
/// `uid` is `None` for objects that are not backed by the store (built-in
/// tools, off-cluster execution engines).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdentity {
    /// Object kind.
    pub kind: ResourceKind,
    /// Object namespace.
    pub namespace: String,
    /// Object name.
    pub name: String,
    /// Store uid, when store-backed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
}

impl ObjectIdentity {
    /// Identity of an object that has no store record.
    pub fn builtin(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            uid: None,
        }
    }

    /// `namespace/name` form used in annotations and log fields.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}
