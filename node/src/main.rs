use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::{Config, File as ConfigFile};
use padron_registry::UserRegistry;
use padron_rpc::{start_server, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod version;

use version::{git_commit_hash, PADRON_VERSION};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "pretty";
const DEFAULT_CONFIG_PATH: &str = "padron.toml";

/// Runtime configuration assembled from the config file, `PADRON_*`
/// environment variables and command line overrides, in that order.
#[derive(Debug, Clone)]
struct AppConfig {
    config_path: Option<PathBuf>,
    host: String,
    port: u16,
    log_level: String,
    log_format: String,
}

impl AppConfig {
    fn load(config_path_override: Option<&str>) -> Result<Self> {
        let resolved_path = if let Some(path) = config_path_override {
            let path = PathBuf::from(path);
            if !path.exists() {
                anyhow::bail!(
                    "Configuration file {} not found (given via --config)",
                    path.display()
                );
            }
            Some(path)
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(config::Environment::with_prefix("PADRON"));
        let config = builder.build()?;

        Ok(Self {
            config_path: resolved_path,
            host: get_string_value(&config, &["HOST", "server.host"])
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get_string_value(&config, &["PORT", "server.port"])
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()?,
            log_level: get_string_value(&config, &["LOG_LEVEL", "log.level"])
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: get_string_value(&config, &["LOG_FORMAT", "log.format"])
                .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("PADRON_HOST must not be empty");
        }
        if self.port == 0 {
            anyhow::bail!("PADRON_PORT must be greater than zero");
        }
        if self.log_format != "pretty" && self.log_format != "json" {
            anyhow::bail!("PADRON_LOG_FORMAT must be 'pretty' or 'json'");
        }
        Ok(())
    }

    fn api_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Looks up the first key that resolves, so both `PADRON_PORT` and a
/// `[server] port` table entry work.
fn get_string_value(config: &Config, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = config.get_string(key) {
            return Some(value);
        }
    }
    None
}

fn load_config_with_overrides(matches: &ArgMatches) -> Result<AppConfig> {
    let config_path = matches.get_one::<String>("config").map(|path| path.as_str());
    let mut config = AppConfig::load(config_path)?;
    apply_overrides(matches, &mut config);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(matches: &ArgMatches, config: &mut AppConfig) {
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(log_level) = matches.get_one::<String>("log-level") {
        config.log_level = log_level.clone();
    }
    if let Some(log_format) = matches.get_one::<String>("log-format") {
        config.log_format = log_format.clone();
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    Ok(())
}

async fn check_status(config: &AppConfig, health_path: &str) -> Result<()> {
    let mut path = health_path.to_string();
    if !path.starts_with('/') {
        path = format!("/{path}");
    }
    let url = format!("http://{}:{}{}", config.host, config.port, path);

    let response = reqwest::Client::new().get(&url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    println!("GET {url} -> {status}");
    println!("{body}");

    if status.is_success() {
        Ok(())
    } else {
        anyhow::bail!("Health check failed with status {status}")
    }
}

fn print_version_info() {
    println!("Padron {} (commit {})", PADRON_VERSION, git_commit_hash());
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("padron-node")
        .version(PADRON_VERSION)
        .about("Padron user registry service")
        .disable_version_flag(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("version_flag")
                .short('V')
                .long("version")
                .action(ArgAction::SetTrue)
                .help("Print version information and exit")
                .global(true),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Override the API bind host")
                .global(true),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .help("Override the API port")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Override the log level")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["pretty", "json"])
                .help("Select the log output format")
                .global(true),
        )
        .subcommand(Command::new("start").about("Start the user API service"))
        .subcommand(
            Command::new("status")
                .about("Query the health endpoint of a running service")
                .arg(
                    Arg::new("health-path")
                        .long("health-path")
                        .value_name("PATH")
                        .default_value("/health")
                        .help("Health endpoint path to query"),
                ),
        )
        .get_matches();

    if matches.get_flag("version_flag") {
        print_version_info();
        return Ok(());
    }

    if let Some(status_matches) = matches.subcommand_matches("status") {
        let config = load_config_with_overrides(status_matches)?;
        let health_path = status_matches
            .get_one::<String>("health-path")
            .map(|path| path.as_str())
            .unwrap_or("/health");
        return check_status(&config, health_path).await;
    }

    // Running without a subcommand behaves like `start`.
    let start_matches = matches.subcommand_matches("start").unwrap_or(&matches);
    let config = load_config_with_overrides(start_matches)?;

    init_logging(&config)?;

    info!("Starting padron node {}", PADRON_VERSION);
    match &config.config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("Config file: (built-in defaults)"),
    }

    let registry = Arc::new(UserRegistry::new());
    let app_state = AppState::new(registry);

    let api_addr = config.api_addr();
    let api_addr_clone = api_addr.clone();
    info!("Starting user API server on {}", api_addr);

    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_server(app_state, &api_addr_clone).await {
            error!("user API server error: {}", e);
        }
    });

    info!("Padron node is ready");
    info!("User API available at: http://{}", api_addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down padron node");

    api_handle.abort();

    info!("Padron node shutdown complete");
    Ok(())
}
