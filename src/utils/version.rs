// version ordering and release classification

use crate::error::{Error, Result};
use regex::Regex;
use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

/// a parsed release version such as `2.10.0` or `2.10.0rc1`
///
/// release components compare numerically with trailing zeros ignored, so
/// `2.10` and `2.10.0` are equal. the tail follows python packaging order:
/// `2.10.0.dev1 < 2.10.0a1 < 2.10.0 < 2.10.0.post1`.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    raw: String,
    release: Vec<u64>,
    pre: Prerelease,
    post: Option<u64>,
    dev: Option<u64>,
}

impl ReleaseVersion {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidVersion {
            version: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (numeric, tail) = trimmed.split_at(split);
        let numeric = numeric.trim_end_matches('.');

        if numeric.is_empty() {
            return Err(invalid("missing numeric release components"));
        }

        let release = numeric
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| invalid("release components must be dot-separated numbers"))?;

        let suffix = parse_suffix(tail).map_err(|reason| invalid(&reason))?;

        Ok(Self {
            raw: raw.to_string(),
            release,
            pre: suffix.pre,
            post: suffix.post,
            dev: suffix.dev,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// pre-releases and dev releases
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty() || self.dev.is_some()
    }

    /// 0 for a bare dev release, 1 for a pre-release, 2 otherwise
    fn phase(&self) -> u8 {
        if !self.pre.is_empty() {
            1
        } else if self.post.is_none() && self.dev.is_some() {
            0
        } else {
            2
        }
    }

    /// first `depth` dot-separated components of the version as written
    pub fn prefix(&self, depth: usize) -> String {
        version_prefix(&self.raw, depth)
    }
}

/// first `depth` dot-separated components of a version string
pub fn version_prefix(version: &str, depth: usize) -> String {
    version
        .split('.')
        .take(depth.max(1))
        .collect::<Vec<_>>()
        .join(".")
}

/// everything after the numeric release components
struct Suffix {
    pre: Prerelease,
    post: Option<u64>,
    dev: Option<u64>,
}

fn parse_suffix(tail: &str) -> std::result::Result<Suffix, String> {
    // build metadata never takes part in ordering
    let tail = tail.split('+').next().unwrap_or_default();
    let tail = tail.trim_start_matches(['-', '.']);
    if tail.is_empty() {
        return Ok(Suffix {
            pre: Prerelease::EMPTY,
            post: None,
            dev: None,
        });
    }

    let mut identifiers: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in tail.chars() {
        if c == '.' || c == '-' {
            if !current.is_empty() {
                identifiers.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !c.is_ascii_alphanumeric() {
            return Err(format!("unexpected character '{}' in pre-release", c));
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            identifiers.push(std::mem::take(&mut current));
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        identifiers.push(current);
    }

    // numeric identifiers may not carry leading zeros
    let identifiers: Vec<String> = identifiers
        .into_iter()
        .map(|id| match id.parse::<u64>() {
            Ok(n) => n.to_string(),
            Err(_) => id.to_ascii_lowercase(),
        })
        .collect();

    // pre-release identifiers first, then `post` and `dev` with an optional number
    let mut pre = Vec::new();
    let mut post = None;
    let mut dev = None;
    let mut iter = identifiers.into_iter().peekable();
    while let Some(id) = iter.next() {
        let segment = match id.as_str() {
            "post" if post.is_none() && dev.is_none() => &mut post,
            "dev" if dev.is_none() => &mut dev,
            _ if post.is_some() || dev.is_some() => {
                return Err(format!("unexpected '{}' after post or dev release", id));
            }
            _ => {
                pre.push(id);
                continue;
            }
        };
        let number = match iter.peek().and_then(|n| n.parse::<u64>().ok()) {
            Some(number) => {
                iter.next();
                number
            }
            None => 0,
        };
        *segment = Some(number);
    }

    Ok(Suffix {
        pre: Prerelease::new(&pre.join(".")).map_err(|e| e.to_string())?,
        post,
        dev,
    })
}

/// a missing dev segment sorts after every dev release
fn cmp_dev(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }

        self.phase()
            .cmp(&other.phase())
            .then_with(|| self.pre.cmp(&other.pre))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| cmp_dev(self.dev, other.dev))
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// sort version strings by version order, oldest first unless `descending`
pub fn sort_versions<'a, I>(versions: I, descending: bool) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut parsed = versions
        .into_iter()
        .map(|v| ReleaseVersion::parse(v))
        .collect::<Result<Vec<_>>>()?;
    if descending {
        parsed.sort_by(|a, b| b.cmp(a));
    } else {
        parsed.sort();
    }
    Ok(parsed.into_iter().map(|v| v.raw).collect())
}

/// sort version strings, newest first
pub fn sort_versions_desc<'a, I>(versions: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    sort_versions(versions, true)
}

/// decides whether a version is a release or a pre-release
///
/// the pre-release pattern is checked first: a tag such as `v2.10.0rc1`
/// usually matches both patterns and must be classified as pre-release.
#[derive(Debug, Clone)]
pub struct VersionClassifier {
    release: Regex,
    pre_release: Regex,
}

impl VersionClassifier {
    pub fn new(release_pattern: &str, pre_release_pattern: &str) -> Result<Self> {
        let compile = |pattern: &str, name: &str| {
            Regex::new(pattern).map_err(|e| Error::ConfigError {
                reason: format!("invalid {} '{}': {}", name, pattern, e),
            })
        };

        Ok(Self {
            release: compile(release_pattern, "release_tag_re")?,
            pre_release: compile(pre_release_pattern, "pre_release_tag_re")?,
        })
    }

    pub fn is_release(&self, version: &str) -> Result<bool> {
        let tag = format!("v{}", version);

        if self.pre_release.is_match(&tag) {
            return Ok(false);
        }

        if self.release.is_match(&tag) {
            return Ok(true);
        }

        Err(Error::UnsupportedVersionFormat {
            version: version.to_string(),
        })
    }
}
