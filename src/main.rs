use anyhow::{Context, Result};
use azcatalog::catalog::{self, Catalog, Operation};
use azcatalog::commands;
use azcatalog::config::Config;
use azcatalog::navigator;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Version injected at compile time via AZCATALOG_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AZCATALOG_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Log filter read from the environment, overrides --log-level
const LOG_ENV: &str = "AZCATALOG_LOG";

/// Browse the Azure resource-type catalog offline
#[derive(Parser, Debug)]
#[command(name = "azcatalog", version = VERSION, about, long_about = None)]
struct Args {
    /// Catalog file (JSON or YAML) to use instead of the embedded one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Subscription used for {subscriptionId}
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Resource group used for {resourceGroupName}
    #[arg(short = 'g', long, global = true)]
    resource_group: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resource-type tree
    Tree {
        /// Deepest level to print (0 = top level only)
        #[arg(long)]
        depth: Option<usize>,

        /// Only print nodes whose label or template contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Check the catalog's structural invariants
    Validate,
    /// Resolve a URL or ARM id to the chain of resource types
    Find {
        url: String,

        #[arg(long)]
        json: bool,
    },
    /// Expand the node at a URL, or list the top level without one
    Expand {
        url: Option<String>,

        /// JSON body returned by reading the URL (needed for instance lists)
        #[arg(long)]
        response: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
    /// Print the request an operation on the node at a URL would send
    Request {
        url: String,

        #[arg(long, value_enum, default_value = "read")]
        op: OpArg,
    },
    /// List API versions per provider namespace
    Versions {
        /// Only this provider namespace (case-insensitive)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Show or update the saved configuration
    Config {
        #[arg(long)]
        set_subscription: Option<String>,

        #[arg(long)]
        set_catalog: Option<PathBuf>,

        #[arg(long)]
        set_endpoint: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OpArg {
    Read,
    Delete,
    Patch,
    Put,
}

impl OpArg {
    fn to_operation(self) -> Operation {
        match self {
            OpArg::Read => Operation::Read,
            OpArg::Delete => Operation::Delete,
            OpArg::Patch => Operation::Patch,
            OpArg::Put => Operation::Put,
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match (EnvFilter::try_from_env(LOG_ENV), level.to_tracing_level()) {
        (Ok(filter), _) => filter,
        (Err(_), Some(tracing_level)) => EnvFilter::new(tracing_level.as_str()),
        (Err(_), None) => return None,
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azcatalog {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("azcatalog").join("azcatalog.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".azcatalog").join("azcatalog.log");
    }
    PathBuf::from("azcatalog.log")
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();
    let catalog_path = args.catalog.clone().or_else(|| config.catalog_path.clone());
    let seed = commands::seed_values(args.subscription, args.resource_group, &config);
    let endpoint = config.effective_endpoint();

    let output = match args.command {
        Command::Tree { depth, filter } => {
            let catalog = open_catalog(catalog_path.as_deref())?;
            commands::render_tree(&catalog, depth, filter.as_deref())?
        }
        Command::Validate => {
            let catalog = open_catalog(catalog_path.as_deref())?;
            commands::run_validate(&catalog)?
        }
        Command::Find { url, json } => {
            let catalog = open_catalog(catalog_path.as_deref())?;
            commands::run_find(&catalog, &url, json)?
        }
        Command::Expand {
            url,
            response,
            json,
        } => {
            let catalog = open_catalog(catalog_path.as_deref())?;
            let response = response.as_deref().map(commands::read_json).transpose()?;
            let output = commands::run_expand(
                &catalog,
                seed,
                url.as_deref(),
                response.as_ref(),
                json,
                &endpoint,
            )?;

            if let Some(url) = &url {
                if let Err(e) = config.set_last_url(url) {
                    tracing::warn!("Failed to save last URL to config: {}", e);
                }
            }
            output
        }
        Command::Request { url, op } => {
            let catalog = open_catalog(catalog_path.as_deref())?;
            commands::run_request(&catalog, seed, &url, op.to_operation(), &endpoint)?
        }
        Command::Versions { provider } => {
            let catalog = open_catalog(catalog_path.as_deref())?;
            commands::run_versions(&catalog, provider.as_deref())?
        }
        Command::Config {
            set_subscription,
            set_catalog,
            set_endpoint,
        } => {
            update_config(&mut config, set_subscription, set_catalog, set_endpoint)?;
            commands::render_config(&config)?
        }
    };

    print!("{}", output);
    Ok(())
}

fn open_catalog(path: Option<&Path>) -> Result<Arc<Catalog>> {
    catalog::load(path).context("Failed to load catalog")
}

fn update_config(
    config: &mut Config,
    subscription: Option<String>,
    catalog_path: Option<PathBuf>,
    endpoint: Option<String>,
) -> Result<()> {
    if let Some(subscription) = subscription {
        config.set_subscription(&subscription)?;
    }
    if let Some(path) = catalog_path {
        catalog::load(Some(path.as_path())).context("Refusing to save an unreadable catalog")?;
        config.set_catalog_path(path)?;
    }
    if let Some(endpoint) = endpoint {
        navigator::parse_base(&endpoint)?;
        config.set_endpoint(&endpoint)?;
    }
    Ok(())
}
