// changelog fragments: model, loading and linting

pub mod linter;
pub mod loader;
pub mod types;

pub use linter::{FragmentLinter, LintIssue, lint_fragments};
pub use loader::{FragmentBatch, discover_fragments, load_fragment, load_fragments};
pub use types::{Fragment, SectionContent};
