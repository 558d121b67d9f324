// change metadata data structures

use crate::utils::changelog::ChangesFormat;
use crate::utils::fragment::SectionContent;
use crate::utils::plugins::{MODULE_TYPE, PluginEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// release content in classic storage: names only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicContent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, Vec<String>>,
}

/// release content in combined storage: merged fragment content and plugin records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedContent {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changes: BTreeMap<String, SectionContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<PluginEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, Vec<PluginEntry>>,
}

/// mode-dependent part of a release, selected once when the store is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReleaseContent {
    Classic(ClassicContent),
    Combined(CombinedContent),
}

impl ReleaseContent {
    pub fn empty(format: ChangesFormat) -> Self {
        match format {
            ChangesFormat::Classic => ReleaseContent::Classic(ClassicContent::default()),
            ChangesFormat::Combined => ReleaseContent::Combined(CombinedContent::default()),
        }
    }

    pub fn fragment_names(&self) -> &[String] {
        match self {
            ReleaseContent::Classic(content) => &content.fragments,
            ReleaseContent::Combined(content) => &content.fragments,
        }
    }

    pub fn module_names(&self) -> Vec<String> {
        match self {
            ReleaseContent::Classic(content) => content.modules.clone(),
            ReleaseContent::Combined(content) => {
                content.modules.iter().map(|m| m.name.clone()).collect()
            }
        }
    }

    pub fn plugin_names(&self) -> BTreeMap<String, Vec<String>> {
        match self {
            ReleaseContent::Classic(content) => content.plugins.clone(),
            ReleaseContent::Combined(content) => content
                .plugins
                .iter()
                .map(|(plugin_type, entries)| {
                    (
                        plugin_type.clone(),
                        entries.iter().map(|e| e.name.clone()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// `(type, name)` of every module and plugin recorded in this release
    pub fn plugin_keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<(String, String)> = self
            .module_names()
            .into_iter()
            .map(|name| (MODULE_TYPE.to_string(), name))
            .collect();
        for (plugin_type, names) in self.plugin_names() {
            keys.extend(names.into_iter().map(|name| (plugin_type.clone(), name)));
        }
        keys
    }

    /// full records, only present in combined storage
    pub fn plugin_records(&self) -> Vec<(&str, &PluginEntry)> {
        match self {
            ReleaseContent::Classic(_) => Vec::new(),
            ReleaseContent::Combined(content) => {
                let mut records: Vec<(&str, &PluginEntry)> =
                    content.modules.iter().map(|m| (MODULE_TYPE, m)).collect();
                for (plugin_type, entries) in &content.plugins {
                    records.extend(entries.iter().map(|e| (plugin_type.as_str(), e)));
                }
                records
            }
        }
    }
}

/// one release in the change metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseEntry {
    pub release_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(flatten)]
    pub content: ReleaseContent,
}

impl ReleaseEntry {
    pub fn new(release_date: NaiveDate, codename: Option<String>, format: ChangesFormat) -> Self {
        Self {
            release_date,
            codename,
            content: ReleaseContent::empty(format),
        }
    }
}

/// release as read from disk, before the storage mode is applied
#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseRecord<C> {
    pub release_date: NaiveDate,
    #[serde(default)]
    pub codename: Option<String>,
    #[serde(flatten)]
    pub content: C,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangesDocument<C> {
    #[serde(default)]
    pub releases: BTreeMap<String, ReleaseRecord<C>>,
}

/// on-disk shape written by the store
#[derive(Debug, Serialize)]
pub(crate) struct ChangesDocumentRef<'a> {
    pub releases: &'a BTreeMap<String, ReleaseEntry>,
}
