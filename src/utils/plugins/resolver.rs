// plugin name resolution

use super::types::{PluginDescription, PluginEntry, PluginKey};
use std::collections::HashMap;

/// turns bare plugin names into display entries
pub trait PluginResolver {
    /// entries for the names that are known, in the order of `names`
    fn resolve(&self, plugin_type: &str, names: &[String]) -> Vec<PluginEntry>;
}

fn resolve_from(
    index: &HashMap<PluginKey, PluginEntry>,
    plugin_type: &str,
    names: &[String],
) -> Vec<PluginEntry> {
    names
        .iter()
        .filter_map(|name| index.get(&PluginKey::new(plugin_type, name.as_str())))
        .cloned()
        .collect()
}

/// resolves against a flat list of discovered plugins (classic storage)
pub struct SimplePluginResolver {
    plugins: HashMap<PluginKey, PluginEntry>,
}

impl SimplePluginResolver {
    pub fn new(plugins: &[PluginDescription]) -> Self {
        Self {
            plugins: plugins.iter().map(|p| (p.key(), p.entry())).collect(),
        }
    }
}

impl PluginResolver for SimplePluginResolver {
    fn resolve(&self, plugin_type: &str, names: &[String]) -> Vec<PluginEntry> {
        resolve_from(&self.plugins, plugin_type, names)
    }
}

/// resolves against records already copied into combined change metadata
pub struct RecordedPluginResolver {
    plugins: HashMap<PluginKey, PluginEntry>,
}

impl RecordedPluginResolver {
    pub fn new<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a PluginEntry)>,
    {
        Self {
            plugins: records
                .into_iter()
                .map(|(plugin_type, entry)| {
                    (PluginKey::new(plugin_type, entry.name.as_str()), entry.clone())
                })
                .collect(),
        }
    }
}

impl PluginResolver for RecordedPluginResolver {
    fn resolve(&self, plugin_type: &str, names: &[String]) -> Vec<PluginEntry> {
        resolve_from(&self.plugins, plugin_type, names)
    }
}
