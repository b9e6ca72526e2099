use crate::cli::{Cli, OutputFormat};
use crate::css_validator::DEFAULT_CSS_VALIDATOR_URI;
use crate::html_validator::DEFAULT_HTML_VALIDATOR_URI;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Trait for abstracting named configuration value lookup
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub retry: RetryConfig,
    pub validators: ValidatorEndpoints,
    pub output: OutputConfig,
    pub files: FileConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Client identifier sent as User-Agent
    pub user_agent: String,
}

/// Polling budget for validator responses that have not settled yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

/// Remote validator endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidatorEndpoints {
    pub html_uri: String,
    pub css_uri: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormatConfig,
    pub verbose: bool,
    pub quiet: bool,
}

/// Which extensions select which validator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub html_extensions: Vec<String>,
    pub css_extensions: Vec<String>,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    Human,
    Json,
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("markup-check/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl Default for ValidatorEndpoints {
    fn default() -> Self {
        Self {
            html_uri: DEFAULT_HTML_VALIDATOR_URI.to_string(),
            css_uri: DEFAULT_CSS_VALIDATOR_URI.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormatConfig::Human,
            verbose: false,
            quiet: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            html_extensions: vec!["html".to_string(), "htm".to_string(), "xhtml".to_string()],
            css_extensions: vec!["css".to_string()],
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            config = Self::load_from_file(config_path).await?;
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = found_config;
        }

        config = Self::apply_environment_overrides(config)?;
        config = Self::merge_with_cli(config, cli);
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "markup-check.toml",
            "markup-check.json",
            ".markup-check.toml",
            ".markup-check.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("markup-check");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(timeout) = env.get("MARKUP_CHECK_TIMEOUT") {
            config.network.timeout_seconds = parse_env("MARKUP_CHECK_TIMEOUT", &timeout)?;
        }

        if let Some(user_agent) = env.get("MARKUP_CHECK_USER_AGENT") {
            config.network.user_agent = user_agent;
        }

        if let Some(attempts) = env.get("MARKUP_CHECK_RETRY_ATTEMPTS") {
            config.retry.attempts = parse_env("MARKUP_CHECK_RETRY_ATTEMPTS", &attempts)?;
        }

        if let Some(delay) = env.get("MARKUP_CHECK_RETRY_DELAY_MS") {
            config.retry.delay_ms = parse_env("MARKUP_CHECK_RETRY_DELAY_MS", &delay)?;
        }

        if let Some(uri) = env.get("MARKUP_CHECK_HTML_URI") {
            config.validators.html_uri = uri;
        }

        if let Some(uri) = env.get("MARKUP_CHECK_CSS_URI") {
            config.validators.css_uri = uri;
        }

        if let Some(format) = env.get("MARKUP_CHECK_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid MARKUP_CHECK_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }
        if let Some(attempts) = cli.retry_attempts {
            config.retry.attempts = attempts;
        }
        if let Some(delay) = cli.retry_delay_ms {
            config.retry.delay_ms = delay;
        }
        if let Some(uri) = &cli.html_validator {
            config.validators.html_uri = uri.clone();
        }
        if let Some(uri) = &cli.css_validator {
            config.validators.css_uri = uri.clone();
        }
        if let Some(format) = cli.output_format {
            config.output.format = format.into();
        }
        config.output.verbose |= cli.verbose;
        config.output.quiet |= cli.quiet;

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.retry.attempts == 0 {
            return Err(ConfigError::Validation(
                "Retry attempts must be greater than 0".to_string(),
            ));
        }

        if config.retry.attempts > 100 {
            return Err(ConfigError::Validation(
                "Retry attempts cannot exceed 100".to_string(),
            ));
        }

        for (name, uri) in [
            ("html_uri", &config.validators.html_uri),
            ("css_uri", &config.validators.css_uri),
        ] {
            Url::parse(uri).map_err(|e| {
                ConfigError::Validation(format!("Invalid {} '{}': {}", name, uri, e))
            })?;
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        for ext in config
            .files
            .html_extensions
            .iter()
            .chain(&config.files.css_extensions)
        {
            if ext.is_empty() || ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid file extension: {}",
                    ext
                )));
            }
        }

        Ok(())
    }

    /// Convert configuration to Duration for retry delay
    pub fn get_retry_delay_duration(config: &Config) -> Duration {
        Duration::from_millis(config.retry.delay_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
}
