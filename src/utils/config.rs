use super::changelog::ChangelogConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const CHANGELOG_DIR: &str = "changelogs";
const CONFIG_FILE: &str = "config.toml";
const GALAXY_FILE: &str = "galaxy.yml";
const PLUGIN_CACHE_FILE: &str = ".plugin-cache.yaml";
const DOC_TOOL: &str = "ansible-doc";

/// filesystem layout of the project whose changelog is managed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub base_dir: PathBuf,
    pub changelog_dir: PathBuf,
    pub config_path: PathBuf,
    /// `galaxy.yml` of a collection; `None` for a core checkout
    pub galaxy_path: Option<PathBuf>,
    /// plugin documentation tool; `None` disables plugin discovery
    pub doc_tool: Option<PathBuf>,
}

impl PathsConfig {
    pub fn new<P: AsRef<Path>>(
        base_dir: P,
        galaxy_path: Option<PathBuf>,
        doc_tool: Option<PathBuf>,
    ) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let changelog_dir = base_dir.join(CHANGELOG_DIR);
        let config_path = changelog_dir.join(CONFIG_FILE);
        Self {
            base_dir,
            changelog_dir,
            config_path,
            galaxy_path,
            doc_tool,
        }
    }

    /// layout of a collection rooted at `base_dir`, used by `init`
    pub fn force_collection<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = absolute(base_dir.as_ref());
        let galaxy_path = base_dir.join(GALAXY_FILE);
        Self::new(&base_dir, Some(galaxy_path), Some(PathBuf::from(DOC_TOOL)))
    }

    /// detect the layout from the current working directory
    pub fn detect() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::detect_from(cwd)
    }

    /// walk up from `start` until a directory with `changelogs/config.toml` is found
    ///
    /// a directory with `galaxy.yml` is a collection; one with `lib/ansible` is a
    /// core checkout that ships its own documentation tool.
    pub fn detect_from<P: AsRef<Path>>(start: P) -> Result<Self> {
        let start = absolute(start.as_ref());
        let mut current = start.as_path();

        loop {
            let config_path = current.join(CHANGELOG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                let galaxy_path = current.join(GALAXY_FILE);
                if galaxy_path.is_file() {
                    return Ok(Self::new(
                        current,
                        Some(galaxy_path),
                        Some(PathBuf::from(DOC_TOOL)),
                    ));
                }
                if current.join("lib").join("ansible").is_dir() {
                    let doc_tool = current.join("bin").join(DOC_TOOL);
                    return Ok(Self::new(current, None, Some(doc_tool)));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => {
                    return Err(Error::PathsNotDetected {
                        start: start.clone(),
                    });
                }
            }
        }
    }

    pub fn is_collection(&self) -> bool {
        self.galaxy_path.is_some()
    }

    pub fn fragments_dir(&self, config: &ChangelogConfig) -> PathBuf {
        self.changelog_dir.join(&config.notes_dir)
    }

    pub fn changes_path(&self, config: &ChangelogConfig) -> PathBuf {
        self.changelog_dir.join(&config.changes_file)
    }

    pub fn plugin_cache_path(&self) -> PathBuf {
        self.changelog_dir.join(PLUGIN_CACHE_FILE)
    }

    /// directory module namespaces are derived from
    pub fn modules_dir(&self) -> PathBuf {
        if self.is_collection() {
            self.base_dir.join("plugins").join("modules")
        } else {
            self.base_dir.join("lib").join("ansible").join("modules")
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_collection_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("changelogs")).unwrap();
        fs::write(root.join("changelogs/config.toml"), "sections = []\n").unwrap();
        fs::write(root.join("galaxy.yml"), "namespace: acme\nname: tools\n").unwrap();
        fs::create_dir_all(root.join("plugins/modules")).unwrap();

        let paths = PathsConfig::detect_from(root.join("plugins/modules")).unwrap();
        assert!(paths.is_collection());
        assert_eq!(paths.base_dir, absolute(root));
        assert_eq!(paths.doc_tool, Some(PathBuf::from("ansible-doc")));
        assert!(paths.modules_dir().ends_with("plugins/modules"));
    }

    #[test]
    fn test_detect_core_checkout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("changelogs")).unwrap();
        fs::write(root.join("changelogs/config.toml"), "sections = []\n").unwrap();
        fs::create_dir_all(root.join("lib/ansible")).unwrap();

        let paths = PathsConfig::detect_from(root).unwrap();
        assert!(!paths.is_collection());
        assert!(paths.doc_tool.unwrap().ends_with("bin/ansible-doc"));
    }

    #[test]
    fn test_detect_fails_without_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = PathsConfig::detect_from(temp_dir.path());
        assert!(matches!(result, Err(Error::PathsNotDetected { .. })));
    }

    #[test]
    fn test_derived_paths() {
        let paths = PathsConfig::new("/repo", None, None);
        let config = ChangelogConfig::default_for(None);

        assert_eq!(paths.config_path, PathBuf::from("/repo/changelogs/config.toml"));
        assert_eq!(
            paths.fragments_dir(&config),
            PathBuf::from("/repo/changelogs/fragments")
        );
        assert_eq!(
            paths.changes_path(&config),
            PathBuf::from("/repo/changelogs/changelog.yaml")
        );
        assert_eq!(
            paths.plugin_cache_path(),
            PathBuf::from("/repo/changelogs/.plugin-cache.yaml")
        );
    }
}
