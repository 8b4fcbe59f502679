use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use importer_core::{config::Config, server::Server, FileImporter};
use importer_sdk::{ContentType, HostRevision, ImportConfig, ImportRequest, Importer};
use regex::Regex;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CONFIG: &str = "config/importer.toml";

#[derive(Parser, Debug)]
#[command(name = "importer", author, version, about = "Local file importer plugin")]
struct Cli {
    /// Sets the log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the importer over HTTP using the supplied configuration file.
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Import one file and print the host response envelope.
    Import {
        /// File name relative to the data directory.
        #[arg(value_name = "IDENTIFIER")]
        identifier: Option<String>,
        #[arg(long, value_name = "DIR", default_value = "test_data")]
        data_dir: PathBuf,
        /// Content type used when the suffix is not recognised.
        #[arg(long, value_name = "TYPE")]
        default_content_type: Option<ContentType>,
        #[arg(long, value_name = "REV", default_value = "v2")]
        revision: HostRevision,
        /// Required for revisions that need instance configuration.
        #[arg(long, value_name = "KEY")]
        access_key: Option<String>,
    },
    /// Interact with configuration files.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print the plugin manifest for the configured importer.
    Manifest {
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Dump the resolved configuration as JSON, secrets redacted.
    Diag {
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validates the provided configuration file.
    Validate {
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },
    /// Prints the bundled example configuration.
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    match cli.command {
        Commands::Serve { config } => handle_serve(&config).await,
        Commands::Import {
            identifier,
            data_dir,
            default_content_type,
            revision,
            access_key,
        } => handle_import(
            ImportRequest {
                identifier,
                default_content_type,
            },
            data_dir,
            revision,
            access_key,
        ),
        Commands::Config { command } => handle_config(command),
        Commands::Manifest { config } => handle_manifest(&config),
        Commands::Diag { config } => handle_diag(&config),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

async fn handle_serve(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    tracing::info!(config = %config_path.display(), "starting importer");
    let server = Server::new(config)?;
    server.run().await
}

fn handle_import(
    request: ImportRequest,
    data_dir: PathBuf,
    revision: HostRevision,
    access_key: Option<String>,
) -> Result<()> {
    let config = access_key
        .map(ImportConfig::new)
        .transpose()
        .context("invalid --access-key")?;
    let importer = FileImporter::new(data_dir, revision, config)
        .with_context(|| format!("cannot construct a {revision} importer"))?;

    let result = importer.run(&request);
    tracing::debug!(ok = result.is_ok(), "import finished");
    println!(
        "{}",
        serde_json::to_string_pretty(&revision.encode_result(&result))?
    );
    result.map(|_| ()).context("import failed")
}

fn handle_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Validate { config } => {
            let cfg = load_config(&config)?;
            cfg.validate()?;
            println!("configuration OK: {}", config.display());
        }
        ConfigCommands::Example => {
            println!("{}", include_str!("../../../config/importer.toml"));
        }
    }
    Ok(())
}

fn handle_manifest(path: &Path) -> Result<()> {
    let cfg = load_config(path)?;
    let importer = FileImporter::from_settings(&cfg.importer)?;
    let json = serde_json::to_string_pretty(&importer.manifest())?;
    println!("{json}");
    Ok(())
}

fn handle_diag(path: &Path) -> Result<()> {
    let cfg = load_config(path)?;
    let json = serde_json::to_string_pretty(&cfg.redacted())?;
    println!("{json}");
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let expanded = interpolate_env(&raw);
    let cfg = toml::from_str::<Config>(&expanded)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}

/// Expands `${NAME}` and `${NAME:default}` from the process environment.
fn interpolate_env(input: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Z0-9_]+)(?::([^}]+))?\}").expect("placeholder pattern is valid")
    });
    regex
        .replace_all(input, |caps: &regex::Captures| {
            let key = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
}
