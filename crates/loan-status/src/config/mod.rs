use crate::eligibility::{ModelSearch, DEFAULT_MODEL_EXTENSIONS, DEFAULT_MODEL_NAMES};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let model = ModelConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            model,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Output layout for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "verbose" => Self::Full,
            _ => Self::Compact,
        }
    }
}

/// Where the prediction artifact is looked up and under which file names.
///
/// Names form the outer loop and extensions the inner loop of the lookup, so the order of
/// both lists is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub directory: PathBuf,
    pub candidate_names: Vec<String>,
    pub extensions: Vec<String>,
}

impl ModelConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let directory = env::var("APP_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let candidate_names = match env::var("APP_MODEL_NAMES") {
            Ok(raw) => {
                let names: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    return Err(ConfigError::EmptyModelNames);
                }
                names
            }
            Err(_) => DEFAULT_MODEL_NAMES.iter().map(|name| name.to_string()).collect(),
        };

        // Empty entries are meaningful here: "" means the bare candidate name.
        let extensions = match env::var("APP_MODEL_EXTENSIONS") {
            Ok(raw) => raw.split(',').map(|ext| ext.trim().to_string()).collect(),
            Err(_) => DEFAULT_MODEL_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        };

        Ok(Self {
            directory,
            candidate_names,
            extensions,
        })
    }

    pub fn search(&self) -> ModelSearch {
        ModelSearch::new(
            self.directory.clone(),
            self.candidate_names.clone(),
            self.extensions.clone(),
        )
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            candidate_names: DEFAULT_MODEL_NAMES.iter().map(|name| name.to_string()).collect(),
            extensions: DEFAULT_MODEL_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyModelNames,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyModelNames => {
                write!(f, "APP_MODEL_NAMES must list at least one candidate name")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::EmptyModelNames => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("APP_MODEL_DIR");
        env::remove_var("APP_MODEL_NAMES");
        env::remove_var("APP_MODEL_EXTENSIONS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.model, ModelConfig::default());
        assert_eq!(
            config.model.candidate_names,
            vec!["loan_staus_model", "loan_status_model"]
        );
        assert_eq!(config.model.extensions, vec!["", ".sav", ".pkl", ".bin"]);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_invalid_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "not-a-port");
        let err = AppConfig::load().expect_err("port must be numeric");
        assert!(matches!(err, ConfigError::InvalidPort));
        reset_env();
    }

    #[test]
    fn model_lists_keep_order_and_empty_extension() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MODEL_DIR", "/srv/models");
        env::set_var("APP_MODEL_NAMES", "primary, fallback ,");
        env::set_var("APP_MODEL_EXTENSIONS", ".json,,.bin");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.model.directory, PathBuf::from("/srv/models"));
        assert_eq!(config.model.candidate_names, vec!["primary", "fallback"]);
        assert_eq!(config.model.extensions, vec![".json", "", ".bin"]);
        reset_env();
    }

    #[test]
    fn blank_model_names_are_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MODEL_NAMES", " , ");
        let err = AppConfig::load().expect_err("names required");
        assert!(matches!(err, ConfigError::EmptyModelNames));
        reset_env();
    }
}
