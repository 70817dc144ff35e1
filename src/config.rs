use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{AfftrackError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub brokers: BrokerConfig,
    #[serde(default)]
    pub autologin: AutoLoginConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// Allowed CORS origin for landing-page requests; empty = same-origin only
    #[serde(default)]
    pub cors_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_backend")]
    pub backend: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_db_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_db_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Dedup cache backend: memory | redis
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub redis_key_prefix: String,
    /// Entry TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    /// Shared secret for inbound broker webhooks
    #[serde(default)]
    pub webhook_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_broker_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_broker_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Ordered provider list; order is the selection policy
    #[serde(default)]
    pub providers: Vec<BrokerProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerProviderConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoLoginConfig {
    #[serde(default = "default_autologin_base_url")]
    pub base_url: String,
    #[serde(default = "default_autologin_token_minutes")]
    pub token_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Status applied when a deposit webhook omits one
    #[serde(default = "default_webhook_default_status")]
    pub default_status: String,
    /// Translation table: provider status label -> canonical status
    #[serde(default = "default_webhook_status_labels")]
    pub status_labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; empty = stdout
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub enable_rotation: bool,
    #[serde(default = "default_log_max_backups")]
    pub max_backups: u32,
}

// Default value functions
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_backend() -> String {
    "sqlite".to_string()
}

fn default_database_url() -> String {
    "afftrack.db".to_string()
}

fn default_db_retry_count() -> u32 {
    3
}

fn default_db_retry_base_delay_ms() -> u64 {
    50
}

fn default_db_retry_max_delay_ms() -> u64 {
    1000
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "afftrack:teaser:".to_string()
}

fn default_cache_ttl() -> u64 {
    86400
}

fn default_access_token_minutes() -> u64 {
    60
}

fn default_broker_timeout_secs() -> u64 {
    10
}

fn default_broker_retry_count() -> u32 {
    1
}

fn default_broker_retry_delay_ms() -> u64 {
    3000
}

fn default_autologin_base_url() -> String {
    "https://trade.example.com/auth/one-time".to_string()
}

fn default_autologin_token_minutes() -> u64 {
    10
}

fn default_webhook_default_status() -> String {
    "approved".to_string()
}

fn default_webhook_status_labels() -> HashMap<String, String> {
    // Providers we integrate with mostly speak the canonical vocabulary;
    // deployments override this table per integration.
    [
        ("pending", "pending"),
        ("approved", "approved"),
        ("rejected", "rejected"),
        ("paid", "paid"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

fn default_log_max_backups() -> u32 {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            api: ApiConfig::default(),
            brokers: BrokerConfig::default(),
            autologin: AutoLoginConfig::default(),
            webhook: WebhookConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            cors_origin: String::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            database_url: default_database_url(),
            retry_count: default_db_retry_count(),
            retry_base_delay_ms: default_db_retry_base_delay_ms(),
            retry_max_delay_ms: default_db_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
            redis_key_prefix: default_redis_key_prefix(),
            ttl: default_cache_ttl(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_minutes: default_access_token_minutes(),
            webhook_token: String::new(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_broker_timeout_secs(),
            retry_count: default_broker_retry_count(),
            retry_delay_ms: default_broker_retry_delay_ms(),
            providers: Vec::new(),
        }
    }
}

impl Default for AutoLoginConfig {
    fn default() -> Self {
        Self {
            base_url: default_autologin_base_url(),
            token_minutes: default_autologin_token_minutes(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            default_status: default_webhook_default_status(),
            status_labels: default_webhook_status_labels(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            format: default_log_format(),
            enable_rotation: false,
            max_backups: default_log_max_backups(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    /// Load configuration from TOML file
    fn load_from_file() -> Self {
        let config_paths = [
            "config.toml",
            "afftrack.toml",
            "config/config.toml",
            "/etc/afftrack/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<Config>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    /// Override configuration with environment variables
    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(cpu_count) = env::var("CPU_COUNT") {
            if let Ok(count) = cpu_count.parse() {
                self.server.cpu_count = count;
            }
        }
        if let Ok(origin) = env::var("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }

        // Database config
        if let Ok(backend) = env::var("DATABASE_BACKEND") {
            self.database.backend = backend;
        }
        if let Ok(database_url) = env::var("DATABASE_URL") {
            self.database.database_url = database_url;
        }

        // Cache config
        if let Ok(backend) = env::var("CACHE_BACKEND") {
            self.cache.backend = backend;
        }
        if let Ok(redis_url) = env::var("REDIS_URL") {
            self.cache.redis_url = redis_url;
        }
        if let Ok(redis_key_prefix) = env::var("REDIS_KEY_PREFIX") {
            self.cache.redis_key_prefix = redis_key_prefix;
        }
        if let Ok(ttl) = env::var("CACHE_TTL") {
            if let Ok(ttl) = ttl.parse() {
                self.cache.ttl = ttl;
            }
        }

        // API config
        if let Ok(jwt_secret) = env::var("JWT_SECRET") {
            self.api.jwt_secret = jwt_secret;
        }
        if let Ok(webhook_token) = env::var("WEBHOOK_TOKEN") {
            self.api.webhook_token = webhook_token;
        }

        // Autologin config
        if let Ok(base_url) = env::var("AUTOLOGIN_BASE_URL") {
            self.autologin.base_url = base_url;
        }

        // Logging config
        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
    }

    /// 启动时校验：状态映射表的每个目标值都必须是合法的规范状态
    pub fn validate(&self) -> Result<()> {
        const CANONICAL: [&str; 4] = ["pending", "approved", "rejected", "paid"];

        for (label, canonical) in &self.webhook.status_labels {
            if !CANONICAL.contains(&canonical.as_str()) {
                return Err(AfftrackError::validation(format!(
                    "webhook.status_labels: '{}' maps to unknown status '{}'. Allowed: {:?}",
                    label, canonical, CANONICAL
                )));
            }
        }

        if !CANONICAL.contains(&self.webhook.default_status.as_str()) {
            return Err(AfftrackError::validation(format!(
                "webhook.default_status '{}' is not a canonical status",
                self.webhook.default_status
            )));
        }

        for provider in &self.brokers.providers {
            if provider.endpoint.is_empty() {
                return Err(AfftrackError::validation(format!(
                    "brokers.providers: provider '{}' has an empty endpoint",
                    provider.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a sample TOML configuration file
    pub fn generate_sample_config() -> String {
        let sample_config = Config::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

// Global configuration instance
use std::sync::OnceLock;
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::load)
}

/// Initialize the global configuration
pub fn init_config() {
    CONFIG.get_or_init(Config::load);
}
