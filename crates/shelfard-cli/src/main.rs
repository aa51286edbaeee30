use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shelfard_core::{Config, Schema};
use shelfard_engine::check;
use shelfard_registry::{schema_name_from_url, SnapshotRegistry};
use shelfard_sources::{parse_header_args, RestEndpointReader, SchemaSource};

mod output;

/// No drift detected / command succeeded
const EXIT_OK: i32 = 0;
/// Drift detected
const EXIT_DRIFT: i32 = 1;
/// Fetch, registry or comparison failure
const EXIT_ERROR: i32 = 2;

/// Environment variable consulted when `--bearer` is not given
const BEARER_ENV: &str = "SHELFARD_BEARER_TOKEN";

/// Shelfard - schema drift detection for JSON endpoints
#[derive(Parser)]
#[command(name = "shelfard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: shelfard.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot and check REST endpoints
    Rest {
        #[command(subcommand)]
        command: RestCommands,
    },

    /// Inspect stored snapshots
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
}

#[derive(Subcommand)]
enum RestCommands {
    /// Fetch an endpoint and record its schema as the next snapshot version
    Snapshot {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Fetch an endpoint and compare it with the latest snapshot
    Check {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Write the JSON drift report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// List registered schemas
    List,

    /// Show a stored snapshot
    Show {
        /// Schema name
        name: String,

        /// Snapshot version (default: latest)
        #[arg(long)]
        version: Option<u32>,

        /// Print the stored JSON instead of a column listing
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct EndpointArgs {
    /// Endpoint URL
    url: String,

    /// Registry name (default: derived from the URL)
    #[arg(short, long)]
    name: Option<String>,

    /// Send Authorization: Bearer <TOKEN> with the request
    #[arg(long, value_name = "TOKEN")]
    bearer: Option<String>,

    /// Extra request header; can be repeated: --header X-Api-Key=abc
    #[arg(long = "header", value_name = "KEY=VALUE")]
    headers: Vec<String>,
}

impl EndpointArgs {
    fn schema_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| schema_name_from_url(&self.url))
    }

    fn reader(&self, config: &Config) -> Result<RestEndpointReader> {
        let mut reader = RestEndpointReader::from_config(&self.url, &config.http)?
            .with_headers(parse_header_args(&self.headers))
            .with_inference(config.inference);

        let token = self.bearer.clone().or_else(|| std::env::var(BEARER_ENV).ok());
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            reader = reader.with_bearer_token(token);
        }

        Ok(reader)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    std::process::exit(execute(cli).await);
}

/// Run a parsed command line and map the outcome to a process exit code
async fn execute(cli: Cli) -> i32 {
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            EXIT_ERROR
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let config = Config::discover(cli.config.as_deref(), &cwd).context("Failed to load config")?;

    if cli.verbose {
        eprintln!("{} {}", "Registry:".cyan(), config.registry_path().display());
    }

    match cli.command {
        Commands::Rest { command } => match command {
            RestCommands::Snapshot { endpoint } => snapshot_command(&config, &endpoint).await,
            RestCommands::Check { endpoint, output, markdown } => {
                check_command(&config, &endpoint, output.as_deref(), markdown.as_deref(), cli.verbose).await
            }
        },
        Commands::Registry { command } => match command {
            RegistryCommands::List => registry_list_command(&config),
            RegistryCommands::Show { name, version, json } => {
                registry_show_command(&config, &name, version, json)
            }
        },
    }
}

fn open_registry(config: &Config) -> Result<SnapshotRegistry> {
    let path = config.registry_path();
    SnapshotRegistry::open(&path)
        .with_context(|| format!("Failed to open registry at {}", path.display()))
}

/// Snapshot command - fetch, infer and record the next version
async fn snapshot_command(config: &Config, endpoint: &EndpointArgs) -> Result<i32> {
    let name = endpoint.schema_name();
    let reader = endpoint.reader(config)?;

    eprintln!("{} {} …", "Fetching".cyan(), endpoint.url);
    let root = reader
        .fetch_schema()
        .await
        .context("Failed to fetch schema")?;

    let registry = open_registry(config)?;
    let schema = registry
        .save(&name, root)
        .context("Failed to register schema")?;

    println!(
        "{}",
        format!(
            "✓ Snapshot saved: '{}' (version {}, {} top-level columns)",
            schema.name,
            schema.version,
            schema.top_level_columns().len()
        )
        .green()
    );

    Ok(EXIT_OK)
}

/// Check command - compare a fresh fetch with the latest snapshot
async fn check_command(
    config: &Config,
    endpoint: &EndpointArgs,
    json_path: Option<&Path>,
    markdown_path: Option<&Path>,
    verbose: bool,
) -> Result<i32> {
    let name = endpoint.schema_name();
    let reader = endpoint.reader(config)?;

    eprintln!("{} {} …", "Fetching".cyan(), endpoint.url);
    let root = reader
        .fetch_schema()
        .await
        .context("Failed to fetch schema")?;

    let registry = open_registry(config)?;
    let baseline = registry
        .latest(&name)
        .context("Failed to load baseline snapshot")?
        .ok_or_else(|| {
            let name_arg = match &endpoint.name {
                Some(n) => format!(" --name {}", n),
                None => String::new(),
            };
            anyhow::anyhow!(
                "No snapshot found for '{}'.\n  Run:  shelfard rest snapshot {}{}",
                name,
                endpoint.url,
                name_arg
            )
        })?;

    let current = Schema::new(name, baseline.version + 1, root);
    let report = check(&baseline, &current).context("Comparison failed")?;

    if let Some(path) = json_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    if let Some(path) = markdown_path {
        std::fs::write(path, output::generate_markdown_report(&report))
            .with_context(|| format!("Failed to write markdown report to {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), path.display());
        }
    }

    print!("{}", output::render_drift(&report));

    Ok(if report.has_changes() { EXIT_DRIFT } else { EXIT_OK })
}

fn registry_list_command(config: &Config) -> Result<i32> {
    let registry = open_registry(config)?;

    let mut latest = Vec::new();
    for name in registry.names()? {
        if let Some(info) = registry.history(&name)?.pop() {
            latest.push(info);
        }
    }

    print!("{}", output::render_registry(&latest));
    Ok(EXIT_OK)
}

fn registry_show_command(config: &Config, name: &str, version: Option<u32>, json: bool) -> Result<i32> {
    let registry = open_registry(config)?;

    let schema = match version {
        Some(v) => registry.get(name, v)?,
        None => registry
            .latest(name)?
            .ok_or_else(|| anyhow::anyhow!("No snapshots registered for '{}'", name))?,
    };

    if json {
        println!("{}", schema.to_json()?);
    } else {
        print!("{}", output::render_schema(&schema, &schema.fingerprint()?));
    }

    Ok(EXIT_OK)
}
