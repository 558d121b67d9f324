// changelog configuration

use crate::error::{Error, Result};
use crate::utils::version::VersionClassifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const DEFAULT_RELEASE_TAG_RE: &str = r"((?:[\d.ab]|rc)+)";
const DEFAULT_PRE_RELEASE_TAG_RE: &str = r"(?P<pre_release>\.\d+(?:[ab]|rc)+\d*)$";

/// how release content is persisted in the changes file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangesFormat {
    /// store fragment names, resolve content from live fragments at render time
    #[default]
    Classic,
    /// store fragment content, fragments may be deleted after the release
    Combined,
}

impl fmt::Display for ChangesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangesFormat::Classic => write!(f, "classic"),
            ChangesFormat::Combined => write!(f, "combined"),
        }
    }
}

/// configuration read from `changelogs/config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// project title used in the document heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// fragment directory, relative to the changelog directory
    #[serde(rename = "notesdir", default = "default_notes_dir")]
    pub notes_dir: String,

    #[serde(rename = "prelude_section_name", default = "default_prelude_name")]
    pub prelude_name: String,

    #[serde(rename = "prelude_section_title", default = "default_prelude_title")]
    pub prelude_title: String,

    /// section after which new plugins and modules are listed (empty: at the end)
    #[serde(default)]
    pub new_plugins_after_name: String,

    #[serde(default = "default_release_tag_re")]
    pub release_tag_re: String,

    #[serde(default = "default_pre_release_tag_re")]
    pub pre_release_tag_re: String,

    /// changes metadata file, relative to the changelog directory
    #[serde(default = "default_changes_file")]
    pub changes_file: String,

    #[serde(default)]
    pub changes_format: ChangesFormat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_fragments: Option<bool>,

    /// output filename; `%s` is replaced by the version prefix
    #[serde(default = "default_filename_template")]
    pub changelog_filename_template: String,

    #[serde(default = "default_filename_version_depth")]
    pub changelog_filename_version_depth: usize,

    /// ordered `[key, title]` pairs, excluding the prelude
    pub sections: Vec<(String, String)>,
}

fn default_notes_dir() -> String {
    "fragments".to_string()
}

fn default_prelude_name() -> String {
    "release_summary".to_string()
}

fn default_prelude_title() -> String {
    "Release Summary".to_string()
}

fn default_release_tag_re() -> String {
    DEFAULT_RELEASE_TAG_RE.to_string()
}

fn default_pre_release_tag_re() -> String {
    DEFAULT_PRE_RELEASE_TAG_RE.to_string()
}

fn default_changes_file() -> String {
    ".changes.yaml".to_string()
}

fn default_filename_template() -> String {
    "CHANGELOG-v%s.rst".to_string()
}

fn default_filename_version_depth() -> usize {
    2
}

impl ChangelogConfig {
    /// configuration with the given sections and every other field defaulted
    pub fn new(sections: Vec<(String, String)>) -> Self {
        Self {
            title: None,
            notes_dir: default_notes_dir(),
            prelude_name: default_prelude_name(),
            prelude_title: default_prelude_title(),
            new_plugins_after_name: String::new(),
            release_tag_re: default_release_tag_re(),
            pre_release_tag_re: default_pre_release_tag_re(),
            changes_file: default_changes_file(),
            changes_format: ChangesFormat::Classic,
            keep_fragments: None,
            changelog_filename_template: default_filename_template(),
            changelog_filename_version_depth: default_filename_version_depth(),
            sections,
        }
    }

    /// scaffold written by `init` for a new collection
    pub fn default_for(title: Option<String>) -> Self {
        let sections = [
            ("major_changes", "Major Changes"),
            ("minor_changes", "Minor Changes"),
            ("deprecated_features", "Deprecated Features"),
            ("removed_features", "Removed Features (previously deprecated)"),
            ("bugfixes", "Bugfixes"),
            ("known_issues", "Known Issues"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            title,
            changes_file: "changelog.yaml".to_string(),
            changes_format: ChangesFormat::Combined,
            changelog_filename_version_depth: 1,
            release_tag_re: r"(v(?:[\d.ab\-]|rc)+)".to_string(),
            pre_release_tag_re: r"(?P<pre_release>(?:[ab]|rc)+\d*)$".to_string(),
            new_plugins_after_name: "removed_features".to_string(),
            ..Self::new(sections)
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn changes_format(mut self, format: ChangesFormat) -> Self {
        self.changes_format = format;
        self
    }

    pub fn keep_fragments(mut self, keep: bool) -> Self {
        self.keep_fragments = Some(keep);
        self
    }

    pub fn new_plugins_after(mut self, section: impl Into<String>) -> Self {
        self.new_plugins_after_name = section.into();
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;

        let config: ChangelogConfig =
            toml::from_str(&contents).map_err(|e| Error::TomlParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string(self)?;
        std::fs::write(path, contents).map_err(|e| Error::write(path, e))
    }

    pub fn validate(&self) -> Result<()> {
        if self.changes_format == ChangesFormat::Classic && !self.should_keep_fragments() {
            return Err(Error::ConfigError {
                reason: "changes_format = \"classic\" cannot be combined with keep_fragments = false"
                    .to_string(),
            });
        }
        if self.changelog_filename_version_depth == 0 {
            return Err(Error::ConfigError {
                reason: "changelog_filename_version_depth must be at least 1".to_string(),
            });
        }
        self.classifier()?;
        Ok(())
    }

    /// classic storage needs the fragments, so they are kept by default there
    pub fn should_keep_fragments(&self) -> bool {
        self.keep_fragments
            .unwrap_or(self.changes_format == ChangesFormat::Classic)
    }

    pub fn classifier(&self) -> Result<VersionClassifier> {
        VersionClassifier::new(&self.release_tag_re, &self.pre_release_tag_re)
    }

    /// all sections in display order, prelude first
    pub fn ordered_sections(&self) -> Vec<(&str, &str)> {
        let mut sections = vec![(self.prelude_name.as_str(), self.prelude_title.as_str())];
        sections.extend(
            self.sections
                .iter()
                .filter(|(key, _)| *key != self.prelude_name)
                .map(|(key, title)| (key.as_str(), title.as_str())),
        );
        sections
    }

    pub fn is_prelude(&self, section: &str) -> bool {
        section == self.prelude_name
    }

    /// true for the prelude and every configured section
    pub fn has_section(&self, section: &str) -> bool {
        self.is_prelude(section) || self.sections.iter().any(|(key, _)| key == section)
    }
}
