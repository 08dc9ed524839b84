//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "studio-blog";
const ENV_PREFIX: &str = "STUDIO_BLOG";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 120;
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
const DEFAULT_FIRESTORE_COLLECTION: &str = "posts";
const DEFAULT_FIRESTORE_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for the studio-blog binary.
#[derive(Debug, Parser)]
#[command(name = "studio-blog", version, about = "Studio blog backend")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "STUDIO_BLOG_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the blog HTTP service.
    Serve(Box<ServeArgs>),
    /// Read posts through the cache and print them as JSON.
    #[command(subcommand)]
    Posts(PostsCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostsCommand {
    /// Print the date-ordered post list.
    List(PostsListArgs),
    /// Print a single post by slug.
    Show(PostsShowArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PostsListArgs {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Bypass the cache TTL and read from the store.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub force: bool,

    /// Only print the newest N posts.
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct PostsShowArgs {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Slug of the post to print.
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct StoreOverrides {
    /// Override the post store backend (memory|firestore).
    #[arg(long = "store-backend", value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Override the JSON seed file loaded into the memory store.
    #[arg(long = "store-seed-file", value_name = "PATH")]
    pub seed_file: Option<PathBuf>,

    /// Override the Firestore project id.
    #[arg(long = "firestore-project-id", value_name = "PROJECT")]
    pub firestore_project_id: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override how long a cached post list stays fresh.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Toggle coalescing of concurrent cache refreshes.
    #[arg(
        long = "cache-single-flight",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_single_flight: Option<bool>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub store: StoreSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub single_flight: bool,
}

#[derive(Debug, Clone)]
pub enum StoreSettings {
    Memory { seed_file: Option<PathBuf> },
    Firestore(FirestoreSettings),
}

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub base_url: Url,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct AdminSettings {
    pub password: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Posts(PostsCommand::List(args))) => raw.apply_store_overrides(&args.store),
        Some(Command::Posts(PostsCommand::Show(args))) => raw.apply_store_overrides(&args.store),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    store: RawStoreSettings,
    admin: RawAdminSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(single_flight) = overrides.cache_single_flight {
            self.cache.single_flight = Some(single_flight);
        }

        self.apply_store_overrides(&overrides.store);
    }

    fn apply_store_overrides(&mut self, overrides: &StoreOverrides) {
        if let Some(backend) = overrides.backend.as_ref() {
            self.store.backend = Some(backend.clone());
        }
        if let Some(path) = overrides.seed_file.as_ref() {
            self.store.seed_file = Some(path.clone());
        }
        if let Some(project) = overrides.firestore_project_id.as_ref() {
            self.store.firestore.project_id = Some(project.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cache,
            store,
            admin,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
            store: build_store_settings(store)?,
            admin: build_admin_settings(admin),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = positive_secs(graceful_secs, "server.graceful_shutdown_seconds")?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_secs = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);

    Ok(CacheSettings {
        ttl: positive_secs(ttl_secs, "cache.ttl_seconds")?,
        single_flight: cache.single_flight.unwrap_or(false),
    })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let backend = store
        .backend
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "memory".to_string());

    match backend.as_str() {
        "memory" => Ok(StoreSettings::Memory {
            seed_file: store.seed_file,
        }),
        "firestore" => build_firestore_settings(store.firestore).map(StoreSettings::Firestore),
        other => Err(LoadError::invalid(
            "store.backend",
            format!("unknown backend `{other}`, expected `memory` or `firestore`"),
        )),
    }
}

fn build_firestore_settings(
    firestore: RawFirestoreSettings,
) -> Result<FirestoreSettings, LoadError> {
    let project_id = non_empty(firestore.project_id).ok_or_else(|| {
        LoadError::invalid(
            "store.firestore.project_id",
            "required when store.backend is `firestore`",
        )
    })?;

    let database = non_empty(firestore.database)
        .unwrap_or_else(|| DEFAULT_FIRESTORE_DATABASE.to_string());
    let collection = non_empty(firestore.collection)
        .unwrap_or_else(|| DEFAULT_FIRESTORE_COLLECTION.to_string());
    if collection.contains('/') {
        return Err(LoadError::invalid(
            "store.firestore.collection",
            "must be a top-level collection id",
        ));
    }

    let raw_url = non_empty(firestore.base_url)
        .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim_end_matches('/')).map_err(|err| {
        LoadError::invalid("store.firestore.base_url", format!("invalid URL: {err}"))
    })?;
    if base_url.cannot_be_a_base() {
        return Err(LoadError::invalid(
            "store.firestore.base_url",
            "URL cannot be used as a base",
        ));
    }

    let timeout_secs = firestore
        .timeout_seconds
        .unwrap_or(DEFAULT_FIRESTORE_TIMEOUT_SECS);

    Ok(FirestoreSettings {
        project_id,
        database,
        collection,
        base_url,
        api_key: non_empty(firestore.api_key),
        bearer_token: non_empty(firestore.bearer_token),
        timeout: positive_secs(timeout_secs, "store.firestore.timeout_seconds")?,
    })
}

fn build_admin_settings(admin: RawAdminSettings) -> AdminSettings {
    AdminSettings {
        password: non_empty(admin.password),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
    single_flight: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    backend: Option<String>,
    seed_file: Option<PathBuf>,
    firestore: RawFirestoreSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFirestoreSettings {
    project_id: Option<String>,
    database: Option<String>,
    collection: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    bearer_token: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    password: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
