// persistent change metadata

use super::types::{
    ChangesDocument, ChangesDocumentRef, ClassicContent, CombinedContent, ReleaseContent,
    ReleaseEntry,
};
use crate::error::{Error, Result};
use crate::utils::changelog::{ChangelogConfig, ChangesFormat};
use crate::utils::diagnostics::Diagnostics;
use crate::utils::fragment::{Fragment, SectionContent};
use crate::utils::plugins::{
    MODULE_TYPE, PluginDescription, PluginKey, PluginResolver, RecordedPluginResolver,
    SimplePluginResolver,
};
use crate::utils::version::ReleaseVersion;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// releases and the fragments and plugins recorded against them
///
/// a fragment or plugin is recorded against at most one release; the known
/// sets are rebuilt on load and checked on every ingestion.
#[derive(Debug, Clone)]
pub struct ChangesStore {
    path: PathBuf,
    config: ChangelogConfig,
    releases: BTreeMap<String, ReleaseEntry>,
    known_fragments: BTreeSet<String>,
    known_plugins: BTreeSet<PluginKey>,
}

impl ChangesStore {
    /// empty store that will be saved to `path`
    pub fn new<P: AsRef<Path>>(path: P, config: &ChangelogConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: config.clone(),
            releases: BTreeMap::new(),
            known_fragments: BTreeSet::new(),
            known_plugins: BTreeSet::new(),
        }
    }

    /// load the store; a missing file yields an empty store
    pub fn load<P: AsRef<Path>>(path: P, config: &ChangelogConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut store = Self::new(path, config);
        if !path.exists() {
            tracing::debug!("no change metadata at {}, starting empty", path.display());
            return Ok(store);
        }

        let contents = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        if contents.trim().is_empty() {
            return Ok(store);
        }

        store.releases = match config.changes_format {
            ChangesFormat::Classic => {
                parse_releases::<ClassicContent>(path, &contents, ReleaseContent::Classic)?
            }
            ChangesFormat::Combined => {
                parse_releases::<CombinedContent>(path, &contents, ReleaseContent::Combined)?
            }
        };

        for version in store.releases.keys() {
            ReleaseVersion::parse(version)?;
        }

        store.rebuild_known();
        tracing::debug!(
            "loaded {} releases from {}",
            store.releases.len(),
            path.display()
        );
        Ok(store)
    }

    fn rebuild_known(&mut self) {
        self.known_fragments.clear();
        self.known_plugins.clear();
        for release in self.releases.values() {
            self.known_fragments
                .extend(release.content.fragment_names().iter().cloned());
            self.known_plugins.extend(
                release
                    .content
                    .plugin_keys()
                    .into_iter()
                    .map(|(plugin_type, name)| PluginKey::new(plugin_type, name)),
            );
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ChangesFormat {
        self.config.changes_format
    }

    pub fn releases(&self) -> &BTreeMap<String, ReleaseEntry> {
        &self.releases
    }

    pub fn release(&self, version: &str) -> Option<&ReleaseEntry> {
        self.releases.get(version)
    }

    pub fn has_release(&self) -> bool {
        !self.releases.is_empty()
    }

    /// highest version by version order, not by string order
    pub fn latest_version(&self) -> Option<&str> {
        self.releases
            .keys()
            .filter_map(|key| ReleaseVersion::parse(key).ok().map(|v| (v, key)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, key)| key.as_str())
    }

    pub fn known_fragments(&self) -> &BTreeSet<String> {
        &self.known_fragments
    }

    pub fn known_plugins(&self) -> &BTreeSet<PluginKey> {
        &self.known_plugins
    }

    pub fn is_known_plugin(&self, plugin_type: &str, name: &str) -> bool {
        self.known_plugins.contains(&PluginKey::new(plugin_type, name))
    }

    /// add a release; re-adding an existing version only warns
    pub fn add_release(
        &mut self,
        version: &str,
        codename: Option<&str>,
        release_date: NaiveDate,
        diags: &mut Diagnostics,
    ) -> Result<bool> {
        ReleaseVersion::parse(version)?;

        if self.releases.contains_key(version) {
            diags.warn(format!("release {} already exists", version));
            return Ok(false);
        }

        let codename = codename.filter(|c| !c.is_empty()).map(str::to_string);
        self.releases.insert(
            version.to_string(),
            ReleaseEntry::new(release_date, codename, self.format()),
        );
        Ok(true)
    }

    /// record a fragment against `version`; false if it was already recorded anywhere
    ///
    /// combined storage merges the content and fails on a second prelude for the
    /// same release, on a section that is not configured, or on a section of the
    /// wrong type. nothing is changed when it fails.
    pub fn add_fragment(&mut self, fragment: &Fragment, version: &str) -> Result<bool> {
        if self.known_fragments.contains(&fragment.name) {
            return Ok(false);
        }

        let config = &self.config;
        let release = self
            .releases
            .get_mut(version)
            .ok_or_else(|| unknown_release(version))?;

        match &mut release.content {
            ReleaseContent::Classic(content) => {
                content.fragments.push(fragment.name.clone());
            }
            ReleaseContent::Combined(content) => {
                for (section, lines) in &fragment.sections {
                    let prelude = config.is_prelude(section);
                    if prelude {
                        if content.changes.contains_key(section) {
                            return Err(Error::DuplicatePrelude {
                                version: version.to_string(),
                                section: section.clone(),
                            });
                        }
                    } else if !config.has_section(section) {
                        return Err(Error::UnknownSection {
                            fragment: fragment.name.clone(),
                            section: section.clone(),
                        });
                    }

                    // the prelude is text, every other section a list of bullets
                    if lines.is_text() != prelude {
                        return Err(Error::FragmentError {
                            path: fragment.path.clone(),
                            reason: format!(
                                "section \"{}\" must be type {} not {}",
                                section,
                                if prelude { "str" } else { "list" },
                                lines.type_name()
                            ),
                        });
                    }
                }

                for (section, lines) in &fragment.sections {
                    match content.changes.get_mut(section) {
                        Some(existing) => existing.merge(lines),
                        None => {
                            content.changes.insert(section.clone(), lines.clone());
                        }
                    }
                }
                content.fragments.push(fragment.name.clone());
            }
        }

        self.known_fragments.insert(fragment.name.clone());
        Ok(true)
    }

    /// record a module or plugin against `version`; false if it was already recorded anywhere
    pub fn add_plugin(&mut self, plugin: &PluginDescription, version: &str) -> Result<bool> {
        let key = plugin.key();
        if self.known_plugins.contains(&key) {
            return Ok(false);
        }

        let release = self
            .releases
            .get_mut(version)
            .ok_or_else(|| unknown_release(version))?;
        match &mut release.content {
            ReleaseContent::Classic(content) => {
                if plugin.is_module() {
                    content.modules.push(plugin.name.clone());
                } else {
                    content
                        .plugins
                        .entry(plugin.plugin_type.clone())
                        .or_default()
                        .push(plugin.name.clone());
                }
            }
            ReleaseContent::Combined(content) => {
                if plugin.is_module() {
                    content.modules.push(plugin.entry());
                } else {
                    content
                        .plugins
                        .entry(plugin.plugin_type.clone())
                        .or_default()
                        .push(plugin.entry());
                }
            }
        }

        self.known_plugins.insert(key);
        Ok(true)
    }

    /// drop fragment names that no longer exist upstream (classic storage only)
    ///
    /// combined storage keeps its fragment names as an ingestion record, the
    /// source files are expected to be gone.
    pub fn prune_fragments(&mut self, fragments: &[Fragment]) {
        let valid: HashSet<&str> = fragments.iter().map(|f| f.name.as_str()).collect();
        let mut removed = Vec::new();

        for release in self.releases.values_mut() {
            if let ReleaseContent::Classic(content) = &mut release.content {
                content.fragments.retain(|name| {
                    let keep = valid.contains(name.as_str());
                    if !keep {
                        removed.push(name.clone());
                    }
                    keep
                });
            }
        }

        for name in removed {
            tracing::debug!("pruning fragment {}", name);
            self.known_fragments.remove(&name);
        }
    }

    /// drop modules and plugins that no longer exist upstream
    pub fn prune_plugins(&mut self, plugins: &[PluginDescription]) {
        let valid: HashSet<PluginKey> = plugins.iter().map(PluginDescription::key).collect();
        let mut removed: Vec<PluginKey> = Vec::new();

        for release in self.releases.values_mut() {
            match &mut release.content {
                ReleaseContent::Classic(content) => {
                    retain_valid(&mut content.modules, MODULE_TYPE, |n| n, &valid, &mut removed);
                    for (plugin_type, names) in content.plugins.iter_mut() {
                        retain_valid(names, plugin_type, |n| n, &valid, &mut removed);
                    }
                    content.plugins.retain(|_, names| !names.is_empty());
                }
                ReleaseContent::Combined(content) => {
                    retain_valid(
                        &mut content.modules,
                        MODULE_TYPE,
                        |e| &e.name,
                        &valid,
                        &mut removed,
                    );
                    for (plugin_type, entries) in content.plugins.iter_mut() {
                        retain_valid(entries, plugin_type, |e| &e.name, &valid, &mut removed);
                    }
                    content.plugins.retain(|_, entries| !entries.is_empty());
                }
            }
        }

        for key in removed {
            tracing::debug!("pruning {} {}", key.plugin_type, key.name);
            self.known_plugins.remove(&key);
        }
    }

    /// canonical order for every list, so saved files diff cleanly
    pub fn sort(&mut self) {
        let prelude = self.config.prelude_name.clone();
        for release in self.releases.values_mut() {
            match &mut release.content {
                ReleaseContent::Classic(content) => {
                    content.fragments.sort();
                    content.modules.sort();
                    for names in content.plugins.values_mut() {
                        names.sort();
                    }
                }
                ReleaseContent::Combined(content) => {
                    content.fragments.sort();
                    content.modules.sort_by(|a, b| a.name.cmp(&b.name));
                    for entries in content.plugins.values_mut() {
                        entries.sort_by(|a, b| a.name.cmp(&b.name));
                    }
                    for (section, lines) in content.changes.iter_mut() {
                        if *section == prelude {
                            continue;
                        }
                        if let SectionContent::Items(items) = lines {
                            items.sort();
                        }
                    }
                }
            }
        }
    }

    /// sorted yaml representation of the store
    pub fn to_yaml(&mut self) -> Result<String> {
        self.sort();
        let document = ChangesDocumentRef {
            releases: &self.releases,
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    /// sort and rewrite the whole file
    pub fn save(&mut self) -> Result<()> {
        let contents = self.to_yaml()?;
        fs::write(&self.path, contents).map_err(|e| Error::write(&self.path, e))?;
        tracing::debug!("saved change metadata to {}", self.path.display());
        Ok(())
    }

    /// resolver matching the storage mode: discovered plugins for classic,
    /// the store's own records for combined
    pub fn plugin_resolver<'a>(
        &'a self,
        plugins: &'a [PluginDescription],
    ) -> Box<dyn PluginResolver + 'a> {
        match self.format() {
            ChangesFormat::Classic => Box::new(SimplePluginResolver::new(plugins)),
            ChangesFormat::Combined => Box::new(RecordedPluginResolver::new(
                self.releases
                    .values()
                    .flat_map(|release| release.content.plugin_records()),
            )),
        }
    }
}

fn unknown_release(version: &str) -> Error {
    Error::UnknownRelease {
        version: version.to_string(),
    }
}

fn retain_valid<T>(
    items: &mut Vec<T>,
    plugin_type: &str,
    name_of: impl Fn(&T) -> &String,
    valid: &HashSet<PluginKey>,
    removed: &mut Vec<PluginKey>,
) {
    items.retain(|item| {
        let key = PluginKey::new(plugin_type, name_of(item).as_str());
        if valid.contains(&key) {
            true
        } else {
            removed.push(key);
            false
        }
    });
}

fn parse_releases<C: DeserializeOwned + Default>(
    path: &Path,
    contents: &str,
    wrap: fn(C) -> ReleaseContent,
) -> Result<BTreeMap<String, ReleaseEntry>> {
    let document: ChangesDocument<C> =
        serde_yaml::from_str(contents).map_err(|e| Error::YamlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(document
        .releases
        .into_iter()
        .map(|(version, record)| {
            (
                version,
                ReleaseEntry {
                    release_date: record.release_date,
                    codename: record.codename,
                    content: wrap(record.content),
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostics::Severity;
    use tempfile::TempDir;

    fn config(format: ChangesFormat) -> ChangelogConfig {
        ChangelogConfig::new(vec![
            ("bugfixes".to_string(), "Bugfixes".to_string()),
            ("minor_changes".to_string(), "Minor Changes".to_string()),
        ])
        .changes_format(format)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 7, 1).unwrap()
    }

    fn fragment(name: &str, sections: &[(&str, SectionContent)]) -> Fragment {
        Fragment::new(
            name,
            sections
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn items(lines: &[&str]) -> SectionContent {
        SectionContent::Items(lines.iter().map(|s| s.to_string()).collect())
    }

    fn store_with(format: ChangesFormat, versions: &[&str]) -> (TempDir, ChangesStore) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("changes.yaml");
        let mut store = ChangesStore::new(path, &config(format));
        let mut diags = Diagnostics::new();
        for version in versions {
            store.add_release(version, None, date(), &mut diags).unwrap();
        }
        (temp_dir, store)
    }

    #[test]
    fn test_add_release_twice_warns() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &["1.0.0"]);
        let mut diags = Diagnostics::new();

        let added = store
            .add_release("1.0.0", Some("other"), date(), &mut diags)
            .unwrap();

        assert!(!added);
        assert!(diags.contains(Severity::Warning, "release 1.0.0 already exists"));
        assert_eq!(store.release("1.0.0").unwrap().codename, None);
    }

    #[test]
    fn test_add_release_rejects_invalid_version() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &[]);
        let result = store.add_release("latest", None, date(), &mut Diagnostics::new());
        assert!(matches!(result, Err(Error::InvalidVersion { .. })));
    }

    #[test]
    fn test_latest_version_uses_version_order() {
        let (_tmp, store) = store_with(ChangesFormat::Classic, &["2.9.0", "2.10.0rc1", "2.10.0"]);
        assert_eq!(store.latest_version(), Some("2.10.0"));
    }

    #[test]
    fn test_plugin_is_recorded_at_most_once() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &["1.0.0", "1.1.0"]);
        let plugin = PluginDescription::new("lookup", "foo", "Foo lookup");

        assert!(store.add_plugin(&plugin, "1.0.0").unwrap());
        assert!(store.is_known_plugin("lookup", "foo"));
        assert!(!store.add_plugin(&plugin, "1.1.0").unwrap());

        let later = &store.release("1.1.0").unwrap().content;
        assert!(later.plugin_names().is_empty());
    }

    #[test]
    fn test_fragment_is_recorded_at_most_once() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &["1.0.0", "1.1.0"]);
        let frag = fragment("a.yml", &[("bugfixes", items(&["fix"]))]);

        assert!(store.add_fragment(&frag, "1.0.0").unwrap());
        assert!(!store.add_fragment(&frag, "1.1.0").unwrap());
        assert_eq!(
            store.release("1.0.0").unwrap().content.fragment_names(),
            &["a.yml".to_string()]
        );
    }

    #[test]
    fn test_add_to_unknown_release() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &[]);
        let frag = fragment("a.yml", &[]);
        assert!(matches!(
            store.add_fragment(&frag, "9.9.9"),
            Err(Error::UnknownRelease { .. })
        ));
    }

    #[test]
    fn test_combined_merges_sections() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let f1 = fragment("f1.yml", &[("bugfixes", items(&["fix Y"]))]);
        let f2 = fragment(
            "f2.yml",
            &[
                ("bugfixes", items(&["fix X"])),
                ("release_summary", SectionContent::Text("Summary".to_string())),
            ],
        );

        assert!(store.add_fragment(&f1, "1.0.0").unwrap());
        assert!(store.add_fragment(&f2, "1.0.0").unwrap());

        let ReleaseContent::Combined(content) = &store.release("1.0.0").unwrap().content else {
            panic!("expected combined content");
        };
        assert_eq!(content.changes["bugfixes"], items(&["fix Y", "fix X"]));
        assert_eq!(
            content.changes["release_summary"],
            SectionContent::Text("Summary".to_string())
        );
        assert_eq!(content.fragments, vec!["f1.yml", "f2.yml"]);
    }

    #[test]
    fn test_combined_duplicate_prelude_is_fatal() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let summary = |text: &str| SectionContent::Text(text.to_string());
        let f1 = fragment("f1.yml", &[("release_summary", summary("A"))]);
        let f2 = fragment(
            "f2.yml",
            &[("bugfixes", items(&["x"])), ("release_summary", summary("B"))],
        );

        store.add_fragment(&f1, "1.0.0").unwrap();
        let result = store.add_fragment(&f2, "1.0.0");

        assert!(matches!(result, Err(Error::DuplicatePrelude { .. })));
        // the failed fragment left nothing behind
        assert!(!store.known_fragments().contains("f2.yml"));
        let ReleaseContent::Combined(content) = &store.release("1.0.0").unwrap().content else {
            panic!("expected combined content");
        };
        assert!(!content.changes.contains_key("bugfixes"));
    }

    #[test]
    fn test_combined_rejects_text_in_list_section() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let listed = fragment("a.yml", &[("bugfixes", items(&["fix A", "fix B"]))]);
        let text = fragment(
            "b.yml",
            &[("bugfixes", SectionContent::Text("fix Z".to_string()))],
        );

        assert!(store.add_fragment(&listed, "1.0.0").unwrap());
        let result = store.add_fragment(&text, "1.0.0");

        assert!(matches!(
            result,
            Err(Error::FragmentError { ref reason, .. })
                if reason == "section \"bugfixes\" must be type list not str"
        ));
        assert!(!store.known_fragments().contains("b.yml"));
        let ReleaseContent::Combined(content) = &store.release("1.0.0").unwrap().content else {
            panic!("expected combined content");
        };
        assert_eq!(content.changes["bugfixes"], items(&["fix A", "fix B"]));
    }

    #[test]
    fn test_combined_rejects_list_prelude() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let frag = fragment("s.yml", &[("release_summary", items(&["not text"]))]);

        assert!(matches!(
            store.add_fragment(&frag, "1.0.0"),
            Err(Error::FragmentError { ref reason, .. })
                if reason == "section \"release_summary\" must be type str not list"
        ));
    }

    #[test]
    fn test_combined_unknown_section_is_fatal() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let frag = fragment("f.yml", &[("trivial", items(&["x"]))]);

        let result = store.add_fragment(&frag, "1.0.0");
        assert!(matches!(
            result,
            Err(Error::UnknownSection { ref section, .. }) if section == "trivial"
        ));
    }

    #[test]
    fn test_classic_round_trip() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &["1.0.0", "1.1.0b1"]);
        store
            .add_fragment(&fragment("b.yml", &[]), "1.0.0")
            .unwrap();
        store
            .add_fragment(&fragment("a.yml", &[]), "1.0.0")
            .unwrap();
        store
            .add_plugin(&PluginDescription::new("module", "ping", "Ping"), "1.0.0")
            .unwrap();
        store
            .add_plugin(&PluginDescription::new("lookup", "foo", "Foo"), "1.1.0b1")
            .unwrap();
        store.save().unwrap();

        let loaded = ChangesStore::load(store.path(), &config(ChangesFormat::Classic)).unwrap();
        assert_eq!(loaded.releases(), store.releases());
        assert_eq!(
            loaded.release("1.0.0").unwrap().content.fragment_names(),
            &["a.yml".to_string(), "b.yml".to_string()]
        );
        assert!(loaded.known_fragments().contains("a.yml"));
        assert!(loaded.is_known_plugin("module", "ping"));
        assert!(loaded.is_known_plugin("lookup", "foo"));
    }

    #[test]
    fn test_combined_round_trip() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let mut diags = Diagnostics::new();
        store
            .add_release("2.0.0", Some("Rooster"), date(), &mut diags)
            .unwrap();
        store
            .add_fragment(
                &fragment(
                    "f.yml",
                    &[
                        ("bugfixes", items(&["zeta", "alpha"])),
                        ("release_summary", SectionContent::Text("Hi".to_string())),
                    ],
                ),
                "2.0.0",
            )
            .unwrap();
        store
            .add_plugin(
                &PluginDescription::new("module", "mod_a", "Manage A").namespace("net.sub"),
                "2.0.0",
            )
            .unwrap();
        store.save().unwrap();

        let yaml = std::fs::read_to_string(store.path()).unwrap();
        assert!(yaml.contains("codename: Rooster"));
        assert!(yaml.contains("namespace: net.sub"));

        let loaded = ChangesStore::load(store.path(), &config(ChangesFormat::Combined)).unwrap();
        assert_eq!(loaded.releases(), store.releases());
        assert!(loaded.known_fragments().contains("f.yml"));
        assert!(loaded.is_known_plugin("module", "mod_a"));

        let ReleaseContent::Combined(content) = &loaded.release("2.0.0").unwrap().content else {
            panic!("expected combined content");
        };
        assert_eq!(content.changes["bugfixes"], items(&["alpha", "zeta"]));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ChangesStore::load(
            temp_dir.path().join("missing.yaml"),
            &config(ChangesFormat::Classic),
        )
        .unwrap();
        assert!(!store.has_release());
        assert_eq!(store.latest_version(), None);
    }

    #[test]
    fn test_load_rejects_invalid_version_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("changes.yaml");
        std::fs::write(
            &path,
            "releases:\n  nightly:\n    release_date: '2020-01-01'\n",
        )
        .unwrap();

        let result = ChangesStore::load(&path, &config(ChangesFormat::Classic));
        assert!(matches!(result, Err(Error::InvalidVersion { .. })));
    }

    #[test]
    fn test_load_requires_release_date() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("changes.yaml");
        std::fs::write(&path, "releases:\n  1.0.0:\n    codename: x\n").unwrap();

        let result = ChangesStore::load(&path, &config(ChangesFormat::Classic));
        assert!(matches!(result, Err(Error::YamlParseError { .. })));
    }

    #[test]
    fn test_prune_fragments_is_idempotent_and_forgets() {
        let (_tmp, mut store) = store_with(ChangesFormat::Classic, &["1.0.0"]);
        let keep = fragment("keep.yml", &[]);
        let gone = fragment("gone.yml", &[]);
        store.add_fragment(&keep, "1.0.0").unwrap();
        store.add_fragment(&gone, "1.0.0").unwrap();

        let live = vec![keep.clone()];
        store.prune_fragments(&live);
        let once = store.releases().clone();
        store.prune_fragments(&live);

        assert_eq!(store.releases(), &once);
        assert_eq!(
            store.release("1.0.0").unwrap().content.fragment_names(),
            &["keep.yml".to_string()]
        );
        assert!(store.known_fragments().contains("keep.yml"));
        assert!(!store.known_fragments().contains("gone.yml"));

        // a pruned fragment can be recorded again
        assert!(store.add_fragment(&gone, "1.0.0").unwrap());
    }

    #[test]
    fn test_prune_plugins_forgets_removed_plugins() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let ping = PluginDescription::new("module", "ping", "Ping");
        let foo = PluginDescription::new("lookup", "foo", "Foo");
        store.add_plugin(&ping, "1.0.0").unwrap();
        store.add_plugin(&foo, "1.0.0").unwrap();

        store.prune_plugins(std::slice::from_ref(&ping));

        let content = &store.release("1.0.0").unwrap().content;
        assert_eq!(content.module_names(), vec!["ping"]);
        assert!(content.plugin_names().is_empty());
        assert!(!store.is_known_plugin("lookup", "foo"));
        assert!(store.add_plugin(&foo, "1.0.0").unwrap());
    }

    #[test]
    fn test_plugin_resolver_follows_storage_mode() {
        let (_tmp, mut store) = store_with(ChangesFormat::Combined, &["1.0.0"]);
        let recorded = PluginDescription::new("lookup", "foo", "Recorded description");
        store.add_plugin(&recorded, "1.0.0").unwrap();

        let discovered = vec![PluginDescription::new("lookup", "foo", "Fresh description")];
        let resolved = store
            .plugin_resolver(&discovered)
            .resolve("lookup", &["foo".to_string()]);
        assert_eq!(resolved[0].description, "Recorded description");

        let (_tmp, classic) = store_with(ChangesFormat::Classic, &["1.0.0"]);
        let resolved = classic
            .plugin_resolver(&discovered)
            .resolve("lookup", &["foo".to_string()]);
        assert_eq!(resolved[0].description, "Fresh description");
    }
}
