// plugin discovery through the external documentation tool, with a yaml cache

use super::types::{MODULE_TYPE, PluginDescription, PluginRecord};
use crate::error::{Error, Result};
use crate::utils::config::PathsConfig;
use crate::utils::diagnostics::Diagnostics;
use crate::utils::galaxy::GalaxyMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

/// plugin types the documentation tool can describe
pub const DOCUMENTABLE_PLUGINS: &[&str] = &[
    "become",
    "cache",
    "callback",
    "cliconf",
    "connection",
    "httpapi",
    "inventory",
    "lookup",
    "netconf",
    "shell",
    "strategy",
    "vars",
    MODULE_TYPE,
];

/// on-disk plugin cache, valid for exactly one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCache {
    pub version: String,
    #[serde(default)]
    pub plugins: BTreeMap<String, BTreeMap<String, PluginRecord>>,
}

impl PluginCache {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        serde_yaml::from_str(&contents).map_err(|e| Error::YamlParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents).map_err(|e| Error::write(path, e))
    }

    pub fn descriptions(&self) -> Vec<PluginDescription> {
        PluginDescription::from_records(&self.plugins)
    }
}

/// load plugin descriptions for `version`, from cache when possible
pub fn load_plugins(
    paths: &PathsConfig,
    version: &str,
    force_reload: bool,
    diags: &mut Diagnostics,
) -> Result<Vec<PluginDescription>> {
    let cache_path = paths.plugin_cache_path();

    if !force_reload && cache_path.is_file() {
        let cache = PluginCache::load(&cache_path)?;
        if cache.version == version {
            return Ok(cache.descriptions());
        }
        diags.info(format!(
            "version {} does not match plugin cache version {}",
            version, cache.version
        ));
    }

    diags.info("refreshing plugin cache");

    let doc_tool = paths.doc_tool.as_ref().ok_or_else(|| Error::ConfigError {
        reason: "no plugin documentation tool configured".to_string(),
    })?;

    let collection_name = match &paths.galaxy_path {
        Some(galaxy_path) => Some(GalaxyMetadata::load(galaxy_path)?.collection_name()),
        None => None,
    };

    let tool = DocTool {
        program: doc_tool,
        collection_name: collection_name.as_deref(),
        modules_dir: paths.modules_dir(),
    };

    let mut cache = PluginCache {
        version: version.to_string(),
        plugins: BTreeMap::new(),
    };
    for plugin_type in DOCUMENTABLE_PLUGINS {
        let records = tool.load_plugin_metadata(plugin_type)?;
        tracing::debug!("found {} {} plugins", records.len(), plugin_type);
        cache.plugins.insert(plugin_type.to_string(), records);
    }

    cache.store(&cache_path)?;
    Ok(cache.descriptions())
}

struct DocTool<'a> {
    program: &'a Path,
    collection_name: Option<&'a str>,
    modules_dir: PathBuf,
}

impl DocTool<'_> {
    fn load_plugin_metadata(&self, plugin_type: &str) -> Result<BTreeMap<String, PluginRecord>> {
        let mut list_args = vec!["--json", "-t", plugin_type, "--list"];
        if let Some(collection) = self.collection_name {
            list_args.push(collection);
        }
        let listing = self.run_json(&list_args)?;
        let names = listed_plugin_names(&listing, self.collection_name);
        if names.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut doc_args = vec!["--json", "-t", plugin_type];
        doc_args.extend(names.iter().map(String::as_str));
        let docs = self.run_json(&doc_args)?;

        Ok(parse_plugin_docs(
            &docs,
            plugin_type,
            self.collection_name,
            &self.modules_dir,
        ))
    }

    fn run_json(&self, args: &[&str]) -> Result<Value> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        tracing::debug!("running {}", command);

        let output = Command::new(self.program)
            .args(args)
            .output()
            .map_err(|e| Error::CommandError {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::CommandError {
                command,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::JsonParseError { command, source: e })
    }
}

/// names from a `--list` run, sorted
///
/// without a collection, fully qualified names from other collections are dropped.
pub fn listed_plugin_names(listing: &Value, collection_name: Option<&str>) -> Vec<String> {
    let Some(map) = listing.as_object() else {
        return Vec::new();
    };

    let mut names: Vec<String> = map
        .keys()
        .filter(|name| {
            collection_name.is_some() || !name.contains('.') || name.starts_with("ansible.builtin.")
        })
        .cloned()
        .collect();
    names.sort();
    names
}

/// records from a documentation run, keyed by short plugin name
pub fn parse_plugin_docs(
    docs: &Value,
    plugin_type: &str,
    collection_name: Option<&str>,
    modules_dir: &Path,
) -> BTreeMap<String, PluginRecord> {
    let mut result = BTreeMap::new();
    let Some(map) = docs.as_object() else {
        return result;
    };

    for (full_name, data) in map {
        let name = collection_name
            .and_then(|c| full_name.strip_prefix(&format!("{}.", c)))
            .unwrap_or(full_name.as_str())
            .to_string();

        let doc = data.get("doc").filter(|d| d.is_object());
        let field = |key: &str| doc.and_then(|d| d.get(key)).and_then(scalar_to_string);

        let namespace = if plugin_type == MODULE_TYPE {
            field("filename").and_then(|f| module_namespace(Path::new(&f), modules_dir))
        } else {
            None
        };

        result.insert(
            name.clone(),
            PluginRecord {
                name,
                description: field("short_description"),
                namespace,
                version_added: field("version_added"),
            },
        );
    }

    result
}

/// `version_added` is frequently written as a bare number
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// dotted directory path of a module file below the modules directory
fn module_namespace(filename: &Path, modules_dir: &Path) -> Option<String> {
    let relative = filename.strip_prefix(modules_dir).ok()?;
    let parts: Vec<String> = relative
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}
