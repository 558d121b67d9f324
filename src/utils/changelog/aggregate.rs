// collapse releases and their pre-releases into changelog entries

use super::config::ChangelogConfig;
use crate::error::Result;
use crate::utils::changes::{ChangesStore, ReleaseContent};
use crate::utils::diagnostics::Diagnostics;
use crate::utils::fragment::{Fragment, SectionContent};
use crate::utils::version::{VersionClassifier, sort_versions_desc};
use std::collections::{BTreeMap, HashMap};

/// merged content of one release and the pre-releases folded into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedEntry {
    pub version: String,
    pub is_release: bool,
    pub changes: BTreeMap<String, SectionContent>,
    pub modules: Vec<String>,
    pub plugins: BTreeMap<String, Vec<String>>,
    /// fragment or version the kept prelude came from
    pub prelude_source: Option<String>,
}

impl CollapsedEntry {
    fn new(version: &str, is_release: bool) -> Self {
        Self {
            version: version.to_string(),
            is_release,
            changes: BTreeMap::new(),
            modules: Vec::new(),
            plugins: BTreeMap::new(),
            prelude_source: None,
        }
    }

    fn merge_sections(
        &mut self,
        prelude_name: &str,
        source: &str,
        version: &str,
        sections: &BTreeMap<String, SectionContent>,
        diags: &mut Diagnostics,
    ) {
        for (section, content) in sections {
            if section == prelude_name {
                if let Some(kept) = &self.prelude_source {
                    diags.info(format!(
                        "skipping prelude of {} in version {} due to newer prelude of {} in version {}",
                        source, version, kept, self.version
                    ));
                    continue;
                }
                self.prelude_source = Some(source.to_string());
                self.changes.insert(section.clone(), content.clone());
                continue;
            }

            match self.changes.get_mut(section) {
                Some(existing) => existing.merge(content),
                None => {
                    self.changes.insert(section.clone(), content.clone());
                }
            }
        }
    }

    fn merge_plugins(&mut self, content: &ReleaseContent) {
        self.modules.extend(content.module_names());
        for (plugin_type, names) in content.plugin_names() {
            self.plugins.entry(plugin_type).or_default().extend(names);
        }
    }
}

/// walks releases newest to oldest and folds pre-releases into the next release
pub struct ChangelogAggregator<'a> {
    config: &'a ChangelogConfig,
    classifier: VersionClassifier,
    fragments: HashMap<&'a str, &'a Fragment>,
}

impl<'a> ChangelogAggregator<'a> {
    /// `fragments` are the live fragments, only consulted for classic storage
    pub fn new(config: &'a ChangelogConfig, fragments: &'a [Fragment]) -> Result<Self> {
        Ok(Self {
            config,
            classifier: config.classifier()?,
            fragments: fragments.iter().map(|f| (f.name.as_str(), f)).collect(),
        })
    }

    /// collapsed entries, newest first
    ///
    /// a release starts a new entry. a pre-release starts one only while no
    /// release entry is open, so pre-releases that were never followed by a
    /// release each keep their own entry. the first prelude seen for an entry
    /// wins and older ones are dropped.
    pub fn aggregate(
        &self,
        changes: &ChangesStore,
        diags: &mut Diagnostics,
    ) -> Result<Vec<CollapsedEntry>> {
        let versions = sort_versions_desc(changes.releases().keys())?;
        let prelude_name = self.config.prelude_name.as_str();

        let mut entries = Vec::new();
        let mut current: Option<CollapsedEntry> = None;

        for version in &versions {
            let Some(release) = changes.release(version) else {
                continue;
            };
            let is_release = self.classifier.is_release(version)?;

            let open_release = current.as_ref().is_some_and(|e| e.is_release);
            if is_release || !open_release {
                entries.extend(current.take());
                current = Some(CollapsedEntry::new(version, is_release));
            }
            let entry = current.get_or_insert_with(|| CollapsedEntry::new(version, is_release));

            match &release.content {
                ReleaseContent::Classic(content) => {
                    for name in &content.fragments {
                        match self.fragments.get(name.as_str()) {
                            Some(fragment) => entry.merge_sections(
                                prelude_name,
                                &fragment.name,
                                version,
                                &fragment.sections,
                                diags,
                            ),
                            None => diags.warn(format!(
                                "fragment {} of version {} no longer exists",
                                name, version
                            )),
                        }
                    }
                }
                ReleaseContent::Combined(content) => {
                    entry.merge_sections(prelude_name, version, version, &content.changes, diags);
                }
            }

            entry.merge_plugins(&release.content);
        }

        entries.extend(current);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::changelog::ChangesFormat;
    use crate::utils::diagnostics::Severity;
    use crate::utils::plugins::PluginDescription;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn config(format: ChangesFormat) -> ChangelogConfig {
        ChangelogConfig::new(vec![("bugfixes".to_string(), "Bugfixes".to_string())])
            .changes_format(format)
    }

    fn text(s: &str) -> SectionContent {
        SectionContent::Text(s.to_string())
    }

    fn items(lines: &[&str]) -> SectionContent {
        SectionContent::Items(lines.iter().map(|s| s.to_string()).collect())
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

    /// store with one fragment per version, recorded in the given order
    fn store(
        temp_dir: &TempDir,
        config: &ChangelogConfig,
        releases: &[(&str, Fragment)],
    ) -> ChangesStore {
        let mut store = ChangesStore::new(temp_dir.path().join("changes.yaml"), config);
        let mut diags = Diagnostics::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        for (version, frag) in releases {
            store.add_release(version, None, date, &mut diags).unwrap();
            store.add_fragment(frag, version).unwrap();
        }
        store
    }

    #[test]
    fn test_newest_prelude_wins_when_collapsing() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(ChangesFormat::Combined);
        let changes = store(
            &temp_dir,
            &config,
            &[
                (
                    "2.10.0rc1",
                    fragment("a.yml", &[("release_summary", text("A"))]),
                ),
                ("2.10.0", fragment("b.yml", &[("release_summary", text("B"))])),
            ],
        );

        let mut diags = Diagnostics::new();
        let entries = ChangelogAggregator::new(&config, &[])
            .unwrap()
            .aggregate(&changes, &mut diags)
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, "2.10.0");
        assert_eq!(entries[0].changes["release_summary"], text("B"));
        assert_eq!(entries[0].prelude_source.as_deref(), Some("2.10.0"));
        assert!(!diags.has_errors());
        assert!(diags.contains(Severity::Info, "skipping prelude of 2.10.0rc1"));
    }

    #[test]
    fn test_sections_accumulate_across_collapsed_versions() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(ChangesFormat::Combined);
        let changes = store(
            &temp_dir,
            &config,
            &[
                ("1.0.0b1", fragment("f1.yml", &[("bugfixes", items(&["fix Y"]))])),
                ("1.0.0", fragment("f2.yml", &[("bugfixes", items(&["fix X"]))])),
                ("0.9.0", fragment("f3.yml", &[("bugfixes", items(&["old"]))])),
            ],
        );

        let entries = ChangelogAggregator::new(&config, &[])
            .unwrap()
            .aggregate(&changes, &mut Diagnostics::new())
            .unwrap();

        let versions: Vec<_> = entries.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "0.9.0"]);
        assert_eq!(entries[0].changes["bugfixes"], items(&["fix X", "fix Y"]));
        assert_eq!(entries[1].changes["bugfixes"], items(&["old"]));
    }

    #[test]
    fn test_unpromoted_prereleases_keep_their_own_entries() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(ChangesFormat::Combined);
        let changes = store(
            &temp_dir,
            &config,
            &[
                ("1.0.0", fragment("a.yml", &[("bugfixes", items(&["a"]))])),
                ("1.1.0b1", fragment("b.yml", &[("bugfixes", items(&["b"]))])),
                ("1.1.0b2", fragment("c.yml", &[("bugfixes", items(&["c"]))])),
            ],
        );

        let entries = ChangelogAggregator::new(&config, &[])
            .unwrap()
            .aggregate(&changes, &mut Diagnostics::new())
            .unwrap();

        let versions: Vec<_> = entries.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["1.1.0b2", "1.1.0b1", "1.0.0"]);
        assert!(!entries[0].is_release);
        assert!(entries[2].is_release);
    }

    #[test]
    fn test_classic_resolves_live_fragments() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(ChangesFormat::Classic);
        let newer = fragment(
            "newer.yml",
            &[("release_summary", text("new")), ("bugfixes", items(&["n"]))],
        );
        let older = fragment(
            "older.yml",
            &[("release_summary", text("old")), ("bugfixes", items(&["o"]))],
        );
        let mut changes = store(
            &temp_dir,
            &config,
            &[("3.0.0rc1", older.clone()), ("3.0.0", newer.clone())],
        );
        let module = PluginDescription::new("module", "ping", "Ping");
        changes.add_plugin(&module, "3.0.0rc1").unwrap();

        let live = vec![newer, older];
        let mut diags = Diagnostics::new();
        let entries = ChangelogAggregator::new(&config, &live)
            .unwrap()
            .aggregate(&changes, &mut diags)
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].changes["release_summary"], text("new"));
        assert_eq!(entries[0].changes["bugfixes"], items(&["n", "o"]));
        assert_eq!(entries[0].prelude_source.as_deref(), Some("newer.yml"));
        assert_eq!(entries[0].modules, vec!["ping"]);
    }

    #[test]
    fn test_classic_missing_fragment_warns() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(ChangesFormat::Classic);
        let changes = store(
            &temp_dir,
            &config,
            &[("1.0.0", fragment("gone.yml", &[("bugfixes", items(&["x"]))]))],
        );

        let mut diags = Diagnostics::new();
        let entries = ChangelogAggregator::new(&config, &[])
            .unwrap()
            .aggregate(&changes, &mut diags)
            .unwrap();

        assert!(entries[0].changes.is_empty());
        assert!(diags.contains(Severity::Warning, "gone.yml"));
    }
}
