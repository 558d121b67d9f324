// builder for creating test collections

use crate::utils::changelog::ChangelogConfig;
use crate::utils::config::PathsConfig;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// builder for a collection checkout with a changelog directory
pub struct TestCollectionBuilder {
    namespace: String,
    name: String,
    version: Option<String>,
    flatmap: bool,
    config: Option<ChangelogConfig>,
    fragments: BTreeMap<String, String>,
    files: BTreeMap<String, String>, // relative path -> content
}

impl TestCollectionBuilder {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: None,
            flatmap: false,
            config: None,
            fragments: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// version written to galaxy.yml
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn flatmap(mut self) -> Self {
        self.flatmap = true;
        self
    }

    /// changelog configuration; without one, `init` defaults are written
    pub fn config(mut self, config: ChangelogConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// fragment file in the notes directory
    pub fn fragment(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.fragments.insert(name.into(), content.into());
        self
    }

    /// arbitrary file relative to the collection root
    pub fn file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// skip the changelog config, leaving an uninitialized collection
    pub fn build_uninitialized(self) -> Result<TestCollection, Box<dyn std::error::Error>> {
        self.build_inner(false)
    }

    pub fn build(self) -> Result<TestCollection, Box<dyn std::error::Error>> {
        self.build_inner(true)
    }

    fn build_inner(self, init: bool) -> Result<TestCollection, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();

        let mut galaxy = format!("namespace: {}\nname: {}\n", self.namespace, self.name);
        if let Some(version) = &self.version {
            galaxy.push_str(&format!("version: {}\n", version));
        }
        if self.flatmap {
            galaxy.push_str("type: flatmap\n");
        }
        fs::write(path.join("galaxy.yml"), galaxy)?;

        let config = self.config.unwrap_or_else(|| {
            ChangelogConfig::default_for(Some(format!("{}.{}", self.namespace, self.name)))
        });
        let paths = PathsConfig::new(&path, Some(path.join("galaxy.yml")), None);

        if init {
            let fragments_dir = paths.fragments_dir(&config);
            fs::create_dir_all(&fragments_dir)?;
            config.store(&paths.config_path)?;

            for (name, content) in &self.fragments {
                fs::write(fragments_dir.join(name), content)?;
            }
        }

        for (rel_path, content) in &self.files {
            let file_path = path.join(rel_path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(file_path, content)?;
        }

        Ok(TestCollection {
            path,
            _temp_dir: temp_dir,
            config,
            paths,
        })
    }
}

/// represents a built test collection
pub struct TestCollection {
    pub path: PathBuf,
    _temp_dir: TempDir,
    pub config: ChangelogConfig,
    pub paths: PathsConfig,
}

impl TestCollection {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.paths.fragments_dir(&self.config)
    }

    pub fn changes_path(&self) -> PathBuf {
        self.paths.changes_path(&self.config)
    }

    /// write another fragment after the collection was built
    pub fn add_fragment(&self, name: &str, content: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.fragments_dir().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn fragment_exists(&self, name: &str) -> bool {
        self.fragments_dir().join(name).exists()
    }

    /// contents of a file in the changelog directory
    pub fn read_changelog_file(&self, name: &str) -> Result<String, Box<dyn std::error::Error>> {
        Ok(fs::read_to_string(self.paths.changelog_dir.join(name))?)
    }
}
