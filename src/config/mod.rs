use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Prefix for environment overrides, e.g. `ROULETTE_PORT=7000`
pub const ENV_PREFIX: &str = "ROULETTE";

/// Environment variable naming an alternative config file
pub const CONFIG_FILE_ENV: &str = "ROULETTE_CONFIG_FILE";

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
    /// Reported as `HostName` in every response envelope
    #[serde(default = "default_host_name")]
    pub host_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_cuisines_table")]
    pub cuisines_table_name: String,
    #[serde(default = "default_dishes_table")]
    pub dishes_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the DynamoDB endpoint, e.g. `http://localhost:8000` for DynamoDB Local
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub auto_create_tables: bool,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    /// Load configuration from defaults, the optional config file and the
    /// environment, then build the AWS clients
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration");

        let settings = load_settings()?;
        let server: ServerConfig = section(&settings, "server")?;
        let database: DatabaseConfig = section(&settings, "database")?;
        let observability: ObservabilityConfig = section(&settings, "observability")?;

        server.validate()?;
        database.validate()?;

        let aws = AwsConfig::load(&database).await;

        let config = Config {
            server,
            database,
            aws,
            observability,
        };

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }
}

fn load_settings() -> Result<config::Config, ConfigError> {
    let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    debug!("Reading optional config file {}", path);

    config::Config::builder()
        .add_source(config::File::with_name(&path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load config: {}", e),
        })
}

/// Deserialize one config section.
///
/// Keys nested under `name` (a `server:` block in `config.yaml`) form the
/// base layer; flat keys, including every `ROULETTE_*` variable, override them.
pub(crate) fn section<T: DeserializeOwned>(
    settings: &config::Config,
    name: &str,
) -> Result<T, ConfigError> {
    let load_error = |e: config::ConfigError| ConfigError::LoadError {
        message: format!("Failed to deserialize {} config: {}", name, e),
    };

    let mut builder = config::Config::builder();
    if let Ok(nested) = settings.get_table(name) {
        for (key, value) in nested {
            builder = builder.set_default(key, value).map_err(load_error)?;
        }
    }

    builder
        .add_source(settings.clone())
        .build()
        .and_then(|merged| merged.try_deserialize())
        .map_err(load_error)
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid host {}: {}", self.host, e),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.cuisines_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Cuisines table name cannot be empty".to_string(),
            });
        }

        if self.dishes_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Dishes table name cannot be empty".to_string(),
            });
        }

        if self.cuisines_table_name == self.dishes_table_name {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Cuisines and dishes cannot share table {}",
                    self.cuisines_table_name
                ),
            });
        }

        Ok(())
    }
}

impl AwsConfig {
    async fn load(database: &DatabaseConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()));

        if let Some(endpoint_url) = &database.endpoint_url {
            info!("Using DynamoDB endpoint {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;

        Self {
            region: database.region.clone(),
            dynamodb_client: DynamoDbClient::new(&sdk_config),
        }
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    6080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn default_cuisines_table() -> String {
    "Cuisines".to_string()
}

pub(crate) fn default_dishes_table() -> String {
    "Dishes".to_string()
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_service_name() -> String {
    "food-roulette-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
