// changelog aggregation and rendering

pub mod aggregate;
pub mod config;
pub mod generator;
pub mod render;

pub use aggregate::{ChangelogAggregator, CollapsedEntry};
pub use config::{ChangelogConfig, ChangesFormat};
pub use generator::{changelog_path, generate_changelog, render_changelog};
pub use render::{ChangelogRenderer, Document, DocumentSection};
