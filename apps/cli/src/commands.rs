//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use courseimport_core::CourseImporter;
use courseimport_shared::{
    AppConfig, CourseImportError, CourseImportResult, ImporterConfig, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// courseimport: suggest course form fields from a landing page.
#[derive(Parser)]
#[command(
    name = "courseimport",
    version,
    about = "Suggest course fields from a course landing page URL.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a course page and print the suggested fields.
    Import {
        /// Course landing-page URL.
        url: String,

        /// Request timeout in seconds (overrides the config file).
        #[arg(long)]
        timeout: Option<u64>,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Run extraction on a saved HTML file without touching the network.
    Extract {
        /// Path to the HTML file.
        file: PathBuf,

        /// URL the page was saved from.
        #[arg(long)]
        url: String,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// pure JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "courseimport_cli=info,courseimport_core=info",
        1 => "courseimport_cli=debug,courseimport_core=debug,courseimport_extract=debug",
        _ => "courseimport_cli=trace,courseimport_core=trace,courseimport_extract=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import {
            url,
            timeout,
            compact,
        } => cmd_import(&url, timeout, compact).await,
        Command::Extract { file, url, compact } => cmd_extract(&file, &url, compact),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Resolve runtime settings: config file first, then CLI overrides.
fn importer_config(timeout: Option<u64>) -> Result<ImporterConfig> {
    let config = load_config()?;
    let mut runtime = ImporterConfig::from(&config);
    if let Some(secs) = timeout {
        if secs == 0 {
            return Err(eyre!("--timeout must be greater than zero"));
        }
        runtime.timeout = Duration::from_secs(secs);
    }
    Ok(runtime)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_import(url: &str, timeout: Option<u64>, compact: bool) -> Result<()> {
    let importer = CourseImporter::new(importer_config(timeout)?)?;
    info!(url, "importing course page");

    let spinner = Spinner::new(format!("Fetching {url}"));
    let outcome = importer.import(url).await;
    spinner.finish();

    finish(outcome, compact)
}

fn cmd_extract(file: &Path, url: &str, compact: bool) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read {}: {e}", file.display()))?;

    let importer = CourseImporter::new(importer_config(None)?)?;
    finish(importer.import_html(url, html, None), compact)
}

/// Print a successful result to stdout, or the import failure to stderr with
/// a non-zero exit.
fn finish(outcome: courseimport_shared::Result<CourseImportResult>, compact: bool) -> Result<()> {
    match outcome {
        Ok(result) => {
            for warning in &result.warnings {
                warn!("{warning}");
            }
            let json = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{json}");
            Ok(())
        }
        Err(CourseImportError::Import { kind, message }) => {
            eprintln!("error [{kind}]: {message}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Stderr spinner shown while the page is fetched.
struct Spinner(ProgressBar);

impl Spinner {
    fn new(message: String) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self(bar)
    }

    fn finish(self) {
        self.0.finish_and_clear();
    }
}
