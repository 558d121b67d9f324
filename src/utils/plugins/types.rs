// plugin data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// plugin type used for modules; every other type is listed under "New Plugins"
pub const MODULE_TYPE: &str = "module";

/// identity of a plugin across releases
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginKey {
    pub plugin_type: String,
    pub name: String,
}

impl PluginKey {
    pub fn new(plugin_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            name: name.into(),
        }
    }
}

/// one discoverable module or plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescription {
    pub plugin_type: String,
    pub name: String,
    pub namespace: Option<String>,
    pub description: String,
    pub version_added: Option<String>,
}

impl PluginDescription {
    pub fn new(
        plugin_type: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            name: name.into(),
            namespace: None,
            description: description.into(),
            version_added: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn version_added(mut self, version: impl Into<String>) -> Self {
        self.version_added = Some(version.into());
        self
    }

    pub fn key(&self) -> PluginKey {
        PluginKey::new(&self.plugin_type, &self.name)
    }

    pub fn is_module(&self) -> bool {
        self.plugin_type == MODULE_TYPE
    }

    /// true if the plugin first appeared in `version`
    ///
    /// `version_added` of `2.9` matches `2.9` and `2.9.1` but not `2.90`.
    pub fn added_in(&self, version: &str) -> bool {
        match &self.version_added {
            Some(added) => version == added || version.starts_with(&format!("{}.", added)),
            None => false,
        }
    }

    pub fn entry(&self) -> PluginEntry {
        PluginEntry {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            description: self.description.clone(),
        }
    }

    /// flatten the `{type: {name: record}}` shape of the plugin cache
    pub fn from_records(data: &BTreeMap<String, BTreeMap<String, PluginRecord>>) -> Vec<Self> {
        data.iter()
            .flat_map(|(plugin_type, plugins)| {
                plugins.iter().map(move |(name, record)| PluginDescription {
                    plugin_type: plugin_type.clone(),
                    name: name.clone(),
                    namespace: record.namespace.clone(),
                    description: record.description.clone().unwrap_or_default(),
                    version_added: record.version_added.clone(),
                })
            })
            .collect()
    }
}

/// display data for a plugin, as stored in combined change metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// documentation of one plugin as produced by discovery and kept in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub version_added: Option<String>,
}
