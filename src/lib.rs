pub mod error;
pub mod utils;

pub use error::*;
pub use utils::changelog::{
    ChangelogAggregator, ChangelogConfig, ChangelogRenderer, ChangesFormat, CollapsedEntry,
    Document, DocumentSection, generate_changelog, render_changelog,
};
pub use utils::changes::{ChangesStore, ReleaseContent, ReleaseEntry, add_release};
pub use utils::config::PathsConfig;
pub use utils::diagnostics::{Diagnostic, Diagnostics, Severity};
pub use utils::fragment::{
    Fragment, FragmentBatch, FragmentLinter, LintIssue, SectionContent, lint_fragments,
    load_fragments,
};
pub use utils::galaxy::GalaxyMetadata;
pub use utils::plugins::{
    PluginDescription, PluginEntry, PluginResolver, RecordedPluginResolver, SimplePluginResolver,
    load_plugins,
};
pub use utils::version::{ReleaseVersion, VersionClassifier};
