use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::recommendation::{RecommendationConfig, RiskSource};

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
    pub models: ModelConfig,
    pub recommendation: RecommendationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let models = ModelConfig {
            food_csv: PathBuf::from(
                env::var("DIABCARE_FOOD_CSV").unwrap_or_else(|_| "food_data.csv".to_string()),
            ),
            classifier_path: optional_path("DIABCARE_CLASSIFIER_PATH"),
            suitability_model_path: optional_path("DIABCARE_SUITABILITY_MODEL_PATH"),
        };

        let risk_source = match env::var("DIABCARE_RISK_SOURCE") {
            Ok(raw) => RiskSource::parse(&raw).ok_or(ConfigError::InvalidRiskSource(raw))?,
            Err(_) => RiskSource::Rules,
        };

        let defaults = RecommendationConfig::default();
        let default_top_n = parse_var("DIABCARE_DEFAULT_TOP_N", defaults.default_top_n)?;
        let max_top_n = parse_var("DIABCARE_MAX_TOP_N", defaults.max_top_n)?;
        if default_top_n == 0 || default_top_n > max_top_n {
            return Err(ConfigError::InvalidTopN {
                default_top_n,
                max_top_n,
            });
        }

        let utc_offset_hours = parse_var("DIABCARE_UTC_OFFSET_HOURS", defaults.utc_offset_hours)?;
        if !(-23..=23).contains(&utc_offset_hours) {
            return Err(ConfigError::InvalidNumber {
                variable: "DIABCARE_UTC_OFFSET_HOURS",
                value: utc_offset_hours.to_string(),
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            models,
            recommendation: RecommendationConfig {
                default_top_n,
                max_top_n,
                utc_offset_hours,
                risk_source,
                ..defaults
            },
        })
    }
}

fn optional_path(variable: &str) -> Option<PathBuf> {
    env::var(variable)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn parse_var<T>(variable: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber {
                variable,
                value: raw,
            }),
        Err(_) => Ok(default),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the catalog and the optional model artifacts.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub food_csv: PathBuf,
    pub classifier_path: Option<PathBuf>,
    pub suitability_model_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str, value: String },
    InvalidTopN { default_top_n: usize, max_top_n: usize },
    InvalidRiskSource(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
            ConfigError::InvalidTopN {
                default_top_n,
                max_top_n,
            } => write!(
                f,
                "DIABCARE_DEFAULT_TOP_N ({default_top_n}) must be between 1 and DIABCARE_MAX_TOP_N ({max_top_n})"
            ),
            ConfigError::InvalidRiskSource(value) => write!(
                f,
                "DIABCARE_RISK_SOURCE must be 'rules' or 'classifier', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
