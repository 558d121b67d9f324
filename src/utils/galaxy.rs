// collection metadata from galaxy.yml

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GalaxyMetadata {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub collection_type: Option<String>,
}

impl GalaxyMetadata {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        serde_yaml::from_str(&contents).map_err(|e| Error::YamlParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// fully qualified collection name, e.g. `acme.tools`
    pub fn collection_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// flatmap collections list modules without their namespace
    pub fn is_flatmap(&self) -> bool {
        self.collection_type.as_deref() == Some("flatmap")
    }

    /// default changelog title, e.g. `Acme.Tools`
    pub fn title(&self) -> String {
        format!("{}.{}", title_case(&self.namespace), title_case(&self.name))
    }
}

/// upper-case the first letter of every alphabetic run, lower-case the rest
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_alpha {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_alpha = true;
        } else {
            result.push(c);
            previous_is_alpha = false;
        }
    }
    result
}
