use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::hiring::{InterviewDatePolicy, InterviewMode, LifecycleConfig};

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

/// Top-level configuration for the marketplace service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lifecycle: LifecycleConfig,
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
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            lifecycle: load_lifecycle()?,
        })
    }
}

fn load_lifecycle() -> Result<LifecycleConfig, ConfigError> {
    let defaults = LifecycleConfig::default();

    let interview_date_policy = match env::var("FAIRHIRE_INTERVIEW_DATE_POLICY") {
        Ok(raw) => InterviewDatePolicy::parse(&raw)
            .ok_or(ConfigError::InvalidInterviewDatePolicy(raw))?,
        Err(_) => defaults.interview_date_policy,
    };

    let default_interview_mode = match env::var("FAIRHIRE_DEFAULT_INTERVIEW_MODE") {
        Ok(raw) => InterviewMode::parse(&raw).ok_or(ConfigError::InvalidInterviewMode(raw))?,
        Err(_) => defaults.default_interview_mode,
    };

    let delta_window_days = match env::var("FAIRHIRE_DELTA_WINDOW_DAYS") {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(days) if days > 0 => days,
            _ => return Err(ConfigError::InvalidDeltaWindow(raw)),
        },
        Err(_) => defaults.delta_window_days,
    };

    Ok(LifecycleConfig {
        interview_date_policy,
        default_interview_mode,
        delta_window_days,
    })
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

/// Output layout for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidInterviewDatePolicy(String),
    InvalidInterviewMode(String),
    InvalidDeltaWindow(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'pretty', got '{value}'")
            }
            ConfigError::InvalidInterviewDatePolicy(value) => write!(
                f,
                "FAIRHIRE_INTERVIEW_DATE_POLICY must be 'default_to_now' or 'require', got '{value}'"
            ),
            ConfigError::InvalidInterviewMode(value) => write!(
                f,
                "FAIRHIRE_DEFAULT_INTERVIEW_MODE must be 'online' or 'in-person', got '{value}'"
            ),
            ConfigError::InvalidDeltaWindow(value) => write!(
                f,
                "FAIRHIRE_DELTA_WINDOW_DAYS must be a positive integer, got '{value}'"
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
