// generate the changelog document from the change metadata

use super::aggregate::ChangelogAggregator;
use super::config::{ChangelogConfig, ChangesFormat};
use super::render::ChangelogRenderer;
use crate::error::{Error, Result};
use crate::utils::changes::ChangesStore;
use crate::utils::config::PathsConfig;
use crate::utils::diagnostics::Diagnostics;
use crate::utils::fragment::Fragment;
use crate::utils::plugins::PluginDescription;
use crate::utils::version::version_prefix;
use std::path::PathBuf;

/// render the full changelog text for the current store contents
pub fn render_changelog(
    config: &ChangelogConfig,
    changes: &ChangesStore,
    plugins: &[PluginDescription],
    fragments: &[Fragment],
    flatmap: bool,
    diags: &mut Diagnostics,
) -> Result<String> {
    let latest = changes.latest_version().ok_or(Error::NoReleases)?;
    let codename = changes
        .release(latest)
        .and_then(|release| release.codename.as_deref());

    let entries = ChangelogAggregator::new(config, fragments)?.aggregate(changes, diags)?;
    let resolver = changes.plugin_resolver(plugins);
    let document = ChangelogRenderer::new(config, resolver.as_ref())
        .flatmap(flatmap)
        .render(&entries, latest, codename);

    Ok(document.to_rst())
}

/// output path for the changelog of `latest_version`
pub fn changelog_path(paths: &PathsConfig, config: &ChangelogConfig, latest_version: &str) -> PathBuf {
    let prefix = version_prefix(latest_version, config.changelog_filename_version_depth);
    paths
        .changelog_dir
        .join(config.changelog_filename_template.replace("%s", &prefix))
}

/// prune stale entries, save the store and write the changelog document
///
/// `plugins` is the freshly discovered plugin list; without it no plugin
/// pruning happens. returns the path of the written document.
pub fn generate_changelog(
    paths: &PathsConfig,
    config: &ChangelogConfig,
    changes: &mut ChangesStore,
    plugins: Option<&[PluginDescription]>,
    fragments: &[Fragment],
    flatmap: bool,
    diags: &mut Diagnostics,
) -> Result<PathBuf> {
    if let Some(plugins) = plugins {
        changes.prune_plugins(plugins);
    }
    if config.changes_format == ChangesFormat::Classic {
        changes.prune_fragments(fragments);
    }
    changes.save()?;

    let latest = changes
        .latest_version()
        .ok_or(Error::NoReleases)?
        .to_string();
    let path = changelog_path(paths, config, &latest);

    let text = render_changelog(
        config,
        changes,
        plugins.unwrap_or_default(),
        fragments,
        flatmap,
        diags,
    )?;
    std::fs::write(&path, text).map_err(|e| Error::write(&path, e))?;

    tracing::info!("wrote changelog to {}", path.display());
    Ok(path)
}
