use anyhow::{Context, Result};
use changenotes::utils::changelog::generate_changelog;
use changenotes::utils::fragment::{FragmentBatch, lint_fragments, load_fragments};
use changenotes::{
    ChangelogConfig, ChangesStore, Diagnostics, Error, GalaxyMetadata, PathsConfig, Severity,
    add_release, load_plugins,
};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "changenotes")]
#[command(version, about = "changelog generator and fragment linter", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// increase verbosity of output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// set up changelog infrastructure for a collection
    Init {
        /// path to the collection root
        root: PathBuf,
    },

    /// check changelog fragments for syntax and content errors
    Lint {
        /// fragments to check (defaults to every fragment in the notes directory)
        fragments: Vec<PathBuf>,
    },

    /// add a new release to the change metadata and regenerate the changelog
    Release {
        /// override release version (defaults to the galaxy.yml version)
        #[arg(long)]
        version: Option<String>,

        /// override release codename
        #[arg(long)]
        codename: Option<String>,

        /// override release date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// force reload of the plugin cache
        #[arg(long)]
        reload_plugins: bool,
    },

    /// regenerate the changelog from the recorded releases
    Generate {
        /// force reload of the plugin cache
        #[arg(long)]
        reload_plugins: bool,
    },
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}

fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,changenotes=info".to_string(),
            2 => "info,changenotes=debug".to_string(),
            _ => "debug,changenotes=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { root } => handle_init(root),
        Commands::Lint { fragments } => handle_lint(&fragments),
        Commands::Release {
            version,
            codename,
            date,
            reload_plugins,
        } => handle_release(version, codename, date, reload_plugins),
        Commands::Generate { reload_plugins } => handle_generate(reload_plugins),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// failure with a dedicated exit code
#[derive(Debug)]
struct CliExit {
    code: u8,
    message: String,
}

impl CliExit {
    fn new(code: u8, message: impl Into<String>) -> anyhow::Error {
        CliExit {
            code,
            message: message.into(),
        }
        .into()
    }
}

impl std::fmt::Display for CliExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliExit {}

/// 2 for nothing-to-do conditions, 3 for missing or already existing files
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(exit) = err.downcast_ref::<CliExit>() {
        return exit.code;
    }
    match err.downcast_ref::<Error>() {
        Some(Error::NoReleases) => 2,
        Some(Error::PathsNotDetected { .. }) => 3,
        Some(Error::FileReadError { .. }) => 3,
        _ => 1,
    }
}

fn detect_paths() -> Result<PathsConfig> {
    PathsConfig::detect().context(
        "only the 'init' command can be used outside a checkout set up for changelog generation",
    )
}

/// short module names for flatmap collections and core checkouts
fn is_flatmap(paths: &PathsConfig) -> Result<bool> {
    match &paths.galaxy_path {
        Some(galaxy_path) => Ok(GalaxyMetadata::load(galaxy_path)
            .context("failed to read galaxy.yml")?
            .is_flatmap()),
        None => Ok(true),
    }
}

fn report(diags: &Diagnostics) {
    for record in diags.records() {
        if record.severity != Severity::Info {
            eprintln!("{}", record);
        }
    }
}

fn handle_init(root: PathBuf) -> Result<()> {
    let paths = PathsConfig::force_collection(&root);
    let galaxy_path = paths
        .galaxy_path
        .clone()
        .unwrap_or_else(|| paths.base_dir.join("galaxy.yml"));

    tracing::debug!("checking {} for existence", galaxy_path.display());
    if !galaxy_path.is_file() {
        return Err(CliExit::new(
            3,
            "the file galaxy.yml does not exist in the collection root",
        ));
    }

    tracing::debug!("checking {} for existence", paths.config_path.display());
    if paths.config_path.exists() {
        return Err(CliExit::new(
            3,
            format!(
                "a configuration file already exists at {}",
                paths.config_path.display()
            ),
        ));
    }

    let galaxy = GalaxyMetadata::load(&galaxy_path).context("failed to read galaxy.yml")?;
    let config = ChangelogConfig::default_for(Some(galaxy.title()));

    let fragments_dir = paths.fragments_dir(&config);
    std::fs::create_dir_all(&fragments_dir)
        .map_err(|e| Error::write(&fragments_dir, e))
        .context("cannot create fragments directory")?;
    println!("created fragments directory {}", fragments_dir.display());

    config
        .store(&paths.config_path)
        .context("cannot create config file")?;
    println!("created config file {}", paths.config_path.display());

    Ok(())
}

fn handle_lint(fragment_paths: &[PathBuf]) -> Result<()> {
    let paths = detect_paths()?;
    let config = ChangelogConfig::load(&paths.config_path).context("failed to load config")?;

    let batch = load_fragments(
        paths.fragments_dir(&config),
        fragment_paths,
        &config.prelude_name,
    )
        .context("failed to read fragments")?;

    for issue in lint_fragments(&config, &batch) {
        println!("{}", issue);
    }
    Ok(())
}

fn load_release_fragments(paths: &PathsConfig, config: &ChangelogConfig) -> Result<FragmentBatch> {
    let batch = load_fragments(paths.fragments_dir(config), &[], &config.prelude_name)
        .context("failed to read fragments")?;
    if !batch.is_clean() {
        for issue in lint_fragments(config, &batch) {
            eprintln!("{}", issue);
        }
    }
    Ok(batch)
}

fn handle_release(
    version: Option<String>,
    codename: Option<String>,
    date: Option<NaiveDate>,
    reload_plugins: bool,
) -> Result<()> {
    let paths = detect_paths()?;
    let config = ChangelogConfig::load(&paths.config_path).context("failed to load config")?;
    let flatmap = is_flatmap(&paths)?;

    let version = match version {
        Some(version) => version,
        None => {
            let galaxy_path = paths
                .galaxy_path
                .as_ref()
                .ok_or_else(|| CliExit::new(2, "--version is required outside a collection"))?;
            GalaxyMetadata::load(galaxy_path)
                .context("failed to read galaxy.yml")?
                .version
                .ok_or_else(|| CliExit::new(2, "galaxy.yml has no version, pass --version"))?
        }
    };
    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut diags = Diagnostics::new();
    let mut changes = ChangesStore::load(paths.changes_path(&config), &config)
        .context("failed to load change metadata")?;
    let plugins = load_plugins(&paths, &version, reload_plugins, &mut diags)
        .context("failed to load plugin descriptions")?;
    let fragments = load_release_fragments(&paths, &config)?
        .into_fragments()
        .context("cannot release with invalid fragments")?;

    add_release(
        &config,
        &mut changes,
        &plugins,
        &fragments,
        &version,
        codename.as_deref(),
        date,
        &mut diags,
    )
    .with_context(|| format!("failed to add release {}", version))?;

    let path = generate_changelog(
        &paths,
        &config,
        &mut changes,
        Some(&plugins),
        &fragments,
        flatmap,
        &mut diags,
    )
    .context("failed to generate changelog")?;

    report(&diags);
    println!("released {} and wrote {}", version, path.display());
    Ok(())
}

fn handle_generate(reload_plugins: bool) -> Result<()> {
    let paths = detect_paths()?;
    let config = ChangelogConfig::load(&paths.config_path).context("failed to load config")?;
    let flatmap = is_flatmap(&paths)?;

    let mut changes = ChangesStore::load(paths.changes_path(&config), &config)
        .context("failed to load change metadata")?;
    let latest = changes
        .latest_version()
        .map(str::to_string)
        .ok_or(Error::NoReleases)
        .context("cannot create a changelog before at least one release has been added")?;

    let mut diags = Diagnostics::new();
    let plugins = load_plugins(&paths, &latest, reload_plugins, &mut diags)
        .context("failed to load plugin descriptions")?;
    let fragments = load_release_fragments(&paths, &config)?
        .into_fragments()
        .context("cannot generate with invalid fragments")?;

    let path = generate_changelog(
        &paths,
        &config,
        &mut changes,
        Some(&plugins),
        &fragments,
        flatmap,
        &mut diags,
    )
    .context("failed to generate changelog")?;

    report(&diags);
    println!("wrote {}", path.display());
    Ok(())
}
