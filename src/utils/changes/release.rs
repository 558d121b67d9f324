// release workflow: record plugins and fragments against a new release

use super::store::ChangesStore;
use crate::error::Result;
use crate::utils::changelog::ChangelogConfig;
use crate::utils::diagnostics::Diagnostics;
use crate::utils::fragment::Fragment;
use crate::utils::plugins::PluginDescription;
use crate::utils::version::ReleaseVersion;
use chrono::NaiveDate;

/// add `version` to the store with every plugin introduced in it and every
/// fragment not yet recorded, then save
///
/// returns the fragments that were newly recorded. when the configuration
/// does not keep fragments, their source files are deleted after saving.
#[allow(clippy::too_many_arguments)]
pub fn add_release<'a>(
    config: &ChangelogConfig,
    changes: &mut ChangesStore,
    plugins: &[PluginDescription],
    fragments: &'a [Fragment],
    version: &str,
    codename: Option<&str>,
    date: NaiveDate,
    diags: &mut Diagnostics,
) -> Result<Vec<&'a Fragment>> {
    ReleaseVersion::parse(version)?;

    let kind = if config.classifier()?.is_release(version)? {
        "release"
    } else {
        "pre-release"
    };
    diags.info(format!("release version {} is a {} version", version, kind));

    changes.add_release(version, codename, date, diags)?;

    let mut plugins_added = 0;
    for plugin in plugins.iter().filter(|p| p.added_in(version)) {
        if changes.add_plugin(plugin, version)? {
            plugins_added += 1;
        }
    }

    let mut fragments_added = Vec::new();
    for fragment in fragments {
        if changes.add_fragment(fragment, version)? {
            fragments_added.push(fragment);
        }
    }

    changes.save()?;
    tracing::info!(
        "recorded {} plugins and {} fragments for {}",
        plugins_added,
        fragments_added.len(),
        version
    );

    if !config.should_keep_fragments() {
        for fragment in &fragments_added {
            tracing::debug!("removing fragment {}", fragment.path.display());
            fragment.remove()?;
        }
    }

    Ok(fragments_added)
}
