// fragment discovery and parsing

use super::types::Fragment;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// outcome of loading a set of fragments; one bad file never aborts the rest
#[derive(Debug, Default)]
pub struct FragmentBatch {
    pub fragments: Vec<Fragment>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl FragmentBatch {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// fail on the first parse error, for commands that cannot proceed without every fragment
    pub fn into_fragments(self) -> Result<Vec<Fragment>> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.fragments),
        }
    }
}

/// parse a single fragment file
pub fn load_fragment<P: AsRef<Path>>(path: P, prelude_name: &str) -> Result<Fragment> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| Error::YamlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
    Fragment::from_value(path, value, prelude_name)
}

/// non-hidden files in the fragment directory, in filename order
pub fn discover_fragments<P: AsRef<Path>>(fragments_dir: P) -> Result<Vec<PathBuf>> {
    let fragments_dir = fragments_dir.as_ref();
    if !fragments_dir.exists() {
        tracing::debug!(
            "fragment directory {} does not exist",
            fragments_dir.display()
        );
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(fragments_dir).map_err(|e| Error::read(fragments_dir, e))? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type()?.is_file() {
            continue;
        }
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// load the given fragment files, or everything in `fragments_dir` when none are given
pub fn load_fragments<P: AsRef<Path>>(
    fragments_dir: P,
    fragment_paths: &[PathBuf],
    prelude_name: &str,
) -> Result<FragmentBatch> {
    let paths = if fragment_paths.is_empty() {
        discover_fragments(fragments_dir)?
    } else {
        fragment_paths.to_vec()
    };

    let mut batch = FragmentBatch::default();
    for path in paths {
        match load_fragment(&path, prelude_name) {
            Ok(fragment) => batch.fragments.push(fragment),
            Err(err) => {
                tracing::debug!("failed to load fragment {}: {}", path.display(), err);
                batch.failures.push((path, err));
            }
        }
    }

    tracing::debug!(
        "loaded {} fragments, {} failures",
        batch.fragments.len(),
        batch.failures.len()
    );
    Ok(batch)
}
