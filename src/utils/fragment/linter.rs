// fragment linting

use super::loader::FragmentBatch;
use super::types::{Fragment, SectionContent};
use crate::error::Error;
use crate::utils::changelog::ChangelogConfig;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// one lint problem, printed as `path:line:col: message`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LintIssue {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl LintIssue {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: 0,
            column: 0,
            message: message.into(),
        }
    }

    /// lint issue for a fragment that could not be loaded at all
    pub fn from_load_error(path: &Path, err: &Error) -> Self {
        match err {
            Error::YamlParseError { source, .. } => {
                let (line, column) = source
                    .location()
                    .map(|l| (l.line(), l.column()))
                    .unwrap_or((0, 0));
                Self {
                    path: path.to_path_buf(),
                    line,
                    column,
                    message: format!("yaml parsing error: {}", source),
                }
            }
            Error::FragmentError { reason, .. } => Self::new(path, reason.clone()),
            other => Self::new(path, other.to_string()),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.path.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

/// structural and markup checks for fragments
pub struct FragmentLinter<'a> {
    config: &'a ChangelogConfig,
}

impl<'a> FragmentLinter<'a> {
    pub fn new(config: &'a ChangelogConfig) -> Self {
        Self { config }
    }

    pub fn lint(&self, fragment: &Fragment) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let issue = |message: String| LintIssue::new(&fragment.path, message);

        for (section, content) in &fragment.sections {
            if self.config.is_prelude(section) {
                if !content.is_text() {
                    issues.push(issue(format!(
                        "section \"{}\" must be type str not {}",
                        section,
                        content.type_name()
                    )));
                }
            } else {
                if content.is_text() {
                    issues.push(issue(format!(
                        "section \"{}\" must be type list not {}",
                        section,
                        content.type_name()
                    )));
                }
                if !self.config.has_section(section) {
                    issues.push(issue(format!("invalid section: {}", section)));
                }
            }

            if let SectionContent::Items(items) = content
                && items.is_empty()
            {
                issues.push(issue(format!("section \"{}\" must not be empty", section)));
            }

            for text in content.texts() {
                issues.extend(check_markup(text).into_iter().map(&issue));
            }
        }

        issues
    }
}

/// inline markup checks: every literal and interpreted text marker needs a closing one
///
/// only backtick balance is checked. this is not a reStructuredText parser, so
/// broken roles, references, emphasis and block markup pass unreported.
fn check_markup(text: &str) -> Vec<String> {
    let mut problems = Vec::new();

    let literal_markers = text.matches("``").count();
    if literal_markers % 2 != 0 {
        problems.push("Inline literal start-string without end-string.".to_string());
    }

    let outside_literals: String = text
        .split("``")
        .step_by(2)
        .collect::<Vec<_>>()
        .join(" ");
    let backticks = outside_literals.matches('`').count();
    if literal_markers % 2 == 0 && backticks % 2 != 0 {
        problems.push(
            "Inline interpreted text or phrase reference start-string without end-string."
                .to_string(),
        );
    }

    problems
}

/// lint every loaded fragment and every load failure; sorted and de-duplicated
pub fn lint_fragments(config: &ChangelogConfig, batch: &FragmentBatch) -> Vec<LintIssue> {
    let linter = FragmentLinter::new(config);

    let mut issues: BTreeSet<LintIssue> = batch
        .failures
        .iter()
        .map(|(path, err)| LintIssue::from_load_error(path, err))
        .collect();

    for fragment in &batch.fragments {
        issues.extend(linter.lint(fragment));
    }

    issues.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config() -> ChangelogConfig {
        ChangelogConfig::new(vec![
            ("bugfixes".to_string(), "Bugfixes".to_string()),
            ("minor_changes".to_string(), "Minor Changes".to_string()),
        ])
    }

    fn fragment(sections: Vec<(&str, SectionContent)>) -> Fragment {
        let sections: BTreeMap<_, _> = sections
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Fragment::new("frag.yml", sections)
    }

    fn items(lines: &[&str]) -> SectionContent {
        SectionContent::Items(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_valid_fragment() {
        let config = config();
        let frag = fragment(vec![
            ("bugfixes", items(&["fix ``foo`` handling"])),
            ("release_summary", SectionContent::Text("summary".to_string())),
        ]);
        assert!(FragmentLinter::new(&config).lint(&frag).is_empty());
    }

    #[test]
    fn test_unknown_section_is_reported() {
        let config = config();
        let frag = fragment(vec![("trivial", items(&["x"]))]);
        let issues = FragmentLinter::new(&config).lint(&frag);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].to_string(), "frag.yml:0:0: invalid section: trivial");
    }

    #[test]
    fn test_wrong_types_are_reported() {
        let config = config();
        let frag = fragment(vec![
            ("bugfixes", SectionContent::Text("oops".to_string())),
            ("release_summary", items(&["a"])),
        ]);
        let messages: Vec<_> = FragmentLinter::new(&config)
            .lint(&frag)
            .into_iter()
            .map(|i| i.message)
            .collect();

        assert!(messages.contains(&"section \"bugfixes\" must be type list not str".to_string()));
        assert!(
            messages.contains(&"section \"release_summary\" must be type str not list".to_string())
        );
    }

    #[test]
    fn test_markup_errors() {
        assert!(check_markup("use ``foo`` and `bar`_").is_empty());
        assert_eq!(check_markup("broken ``literal").len(), 1);
        assert_eq!(check_markup("broken `ref").len(), 1);
    }

    #[test]
    fn test_lint_fragments_sorts_and_dedups() {
        let config = config();
        let frag = fragment(vec![("zzz", items(&["a"])), ("aaa", items(&["b"]))]);
        let batch = FragmentBatch {
            fragments: vec![frag.clone(), frag],
            failures: vec![(
                PathBuf::from("bad.yml"),
                Error::FragmentError {
                    path: PathBuf::from("bad.yml"),
                    reason: "file must be a mapping not list".to_string(),
                },
            )],
        };

        let lines: Vec<_> = lint_fragments(&config, &batch)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            lines,
            vec![
                "bad.yml:0:0: file must be a mapping not list",
                "frag.yml:0:0: invalid section: aaa",
                "frag.yml:0:0: invalid section: zzz",
            ]
        );
    }
}
