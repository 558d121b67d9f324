// fragment data structures

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// content of one section: free text (prelude) or a list of bullets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    Text(String),
    Items(Vec<String>),
}

impl SectionContent {
    pub fn is_text(&self) -> bool {
        matches!(self, SectionContent::Text(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SectionContent::Text(_) => "str",
            SectionContent::Items(_) => "list",
        }
    }

    /// every text carried by this section
    pub fn texts(&self) -> Vec<&str> {
        match self {
            SectionContent::Text(text) => vec![text.as_str()],
            SectionContent::Items(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// text replaces text; any other pairing appends as list items
    pub fn merge(&mut self, other: &SectionContent) {
        if self.is_text() && other.is_text() {
            *self = other.clone();
            return;
        }

        let mut items = match std::mem::replace(self, SectionContent::Items(Vec::new())) {
            SectionContent::Text(text) => vec![text],
            SectionContent::Items(items) => items,
        };
        items.extend(other.texts().into_iter().map(str::to_string));
        *self = SectionContent::Items(items);
    }
}

/// one contributor-authored changelog note
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// file basename, used as the stable identity
    pub name: String,
    pub path: PathBuf,
    pub sections: BTreeMap<String, SectionContent>,
}

impl Fragment {
    pub fn new(name: impl Into<String>, sections: BTreeMap<String, SectionContent>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            sections,
        }
    }

    /// build a fragment from an already parsed yaml document
    ///
    /// `prelude_name` only shapes the error for a section that is neither
    /// text nor a list; section types are checked by the linter and on ingestion.
    pub fn from_value<P: AsRef<Path>>(path: P, value: Value, prelude_name: &str) -> Result<Self> {
        let path = path.as_ref();
        let fail = |reason: String| Error::FragmentError {
            path: path.to_path_buf(),
            reason,
        };

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(fail(format!(
                    "file must be a mapping not {}",
                    yaml_type_name(&other)
                )));
            }
        };

        let mut sections = BTreeMap::new();
        for (key, content) in mapping {
            let section = match key {
                Value::String(section) => section,
                other => {
                    return Err(fail(format!(
                        "section names must be type str not {}",
                        yaml_type_name(&other)
                    )));
                }
            };

            let content = match content {
                Value::String(text) => SectionContent::Text(text),
                Value::Sequence(items) => {
                    let mut lines = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::String(line) => lines.push(line),
                            other => {
                                return Err(fail(format!(
                                    "section \"{}\" list items must be type str not {}",
                                    section,
                                    yaml_type_name(&other)
                                )));
                            }
                        }
                    }
                    SectionContent::Items(lines)
                }
                other => {
                    let expected = if section == prelude_name { "str" } else { "list" };
                    return Err(fail(format!(
                        "section \"{}\" must be type {} not {}",
                        section,
                        expected,
                        yaml_type_name(&other)
                    )));
                }
            };

            sections.insert(section, content);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Ok(Self {
            name,
            path: path.to_path_buf(),
            sections,
        })
    }

    pub fn section(&self, section: &str) -> Option<&SectionContent> {
        self.sections.get(section)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// delete the source file after its content was copied into the store
    pub fn remove(&self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|e| Error::write(&self.path, e))
    }

    /// combine fragments in order: lists concatenate, text replaces text
    pub fn combine<'a, I>(fragments: I) -> BTreeMap<String, SectionContent>
    where
        I: IntoIterator<Item = &'a Fragment>,
    {
        let mut result: BTreeMap<String, SectionContent> = BTreeMap::new();
        for fragment in fragments {
            for (section, content) in &fragment.sections {
                match result.get_mut(section) {
                    Some(existing) => existing.merge(content),
                    None => {
                        result.insert(section.clone(), content.clone());
                    }
                }
            }
        }
        result
    }
}

fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "dict",
        Value::Tagged(_) => "tagged",
    }
}
