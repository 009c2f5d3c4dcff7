use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::logging::LogLevel;

const DEFAULT_HTTP_PORT: u16 = 8000;
const DEFAULT_LOG_FILE: &str = "social_media.log";
const DEFAULT_LOG_MAX_BYTES: u64 = 1024 * 1024;
const DEFAULT_LOG_BACKUP_COUNT: usize = 5;

/// Deployment profile. Selects the correlation token length, the email
/// reveal length and the application logger threshold together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn correlation_id_length(self) -> usize {
        match self {
            Environment::Dev => 8,
            Environment::Prod => 32,
        }
    }

    pub fn email_reveal_length(self) -> usize {
        match self {
            Environment::Dev => 3,
            Environment::Prod => 0,
        }
    }

    pub fn default_log_level(self) -> LogLevel {
        match self {
            Environment::Dev => LogLevel::Debug,
            Environment::Prod => LogLevel::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(ConfigurationError::UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs of the logging pipeline.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub environment: Environment,
    pub log_file: PathBuf,
    pub max_bytes: u64,
    pub backup_count: usize,
}

impl LogSettings {
    pub fn new(environment: Environment, log_file: impl Into<PathBuf>) -> Self {
        Self {
            environment,
            log_file: log_file.into(),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backup_count: DEFAULT_LOG_BACKUP_COUNT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub http_port: u16,
    pub log: LogSettings,
}

impl Settings {
    /// Validates the settings and returns an error if invalid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_port(self.http_port)?;
        if self.log.max_bytes == 0 {
            return Err(ConfigurationError::Invalid(
                "LOG_MAX_BYTES must be greater than 0".into(),
            ));
        }
        if self.log.log_file.as_os_str().is_empty() {
            return Err(ConfigurationError::Invalid("LOG_FILE cannot be empty".into()));
        }
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        self.log.environment
    }
}

fn validate_port(port: u16) -> Result<(), ConfigurationError> {
    if port == 0 {
        return Err(ConfigurationError::Invalid("Port cannot be 0".into()));
    }
    Ok(())
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigurationError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigurationError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

/// `HTTP_PORT` alone, for callers that do not need a profile.
pub fn http_port_from(lookup: impl Fn(&str) -> Option<String>) -> Result<u16, ConfigurationError> {
    let port = parse_or(&lookup, "HTTP_PORT", DEFAULT_HTTP_PORT)?;
    validate_port(port)?;
    Ok(port)
}

/// Load settings from an arbitrary key lookup.
pub fn configuration_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigurationError> {
    let environment = lookup("ENV_STATE")
        .ok_or(ConfigurationError::MissingVariable("ENV_STATE"))?
        .parse::<Environment>()?;

    let http_port = http_port_from(&lookup)?;
    let log_file = lookup("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    let max_bytes = parse_or(&lookup, "LOG_MAX_BYTES", DEFAULT_LOG_MAX_BYTES)?;
    let backup_count = parse_or(&lookup, "LOG_BACKUP_COUNT", DEFAULT_LOG_BACKUP_COUNT)?;

    let settings = Settings {
        http_port,
        log: LogSettings {
            environment,
            log_file: PathBuf::from(log_file),
            max_bytes,
            backup_count,
        },
    };

    settings.validate()?;

    Ok(settings)
}

/// Load settings from the process environment.
pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    configuration_from(|key| env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_dev_profile_parameters() {
        let env = Environment::Dev;
        assert_eq!(env.correlation_id_length(), 8);
        assert_eq!(env.email_reveal_length(), 3);
        assert_eq!(env.default_log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_prod_profile_parameters() {
        let env = Environment::Prod;
        assert_eq!(env.correlation_id_length(), 32);
        assert_eq!(env.email_reveal_length(), 0);
        assert_eq!(env.default_log_level(), LogLevel::Info);
    }

    #[test]
    fn test_environment_parse_is_case_insensitive() {
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!(" prod ".parse::<Environment>().unwrap(), Environment::Prod);
    }

    #[test]
    fn test_unknown_environment_fails() {
        let err = "staging".parse::<Environment>().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownEnvironment(ref v) if v == "staging"));
    }

    #[test]
    fn test_missing_environment_fails() {
        let err = configuration_from(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingVariable("ENV_STATE")));
    }

    #[test]
    fn test_defaults_applied() {
        let settings = configuration_from(lookup(&[("ENV_STATE", "dev")])).unwrap();
        assert_eq!(settings.http_port, 8000);
        assert_eq!(settings.environment(), Environment::Dev);
        assert_eq!(settings.log.log_file, PathBuf::from("social_media.log"));
        assert_eq!(settings.log.max_bytes, 1024 * 1024);
        assert_eq!(settings.log.backup_count, 5);
    }

    #[test]
    fn test_overrides_applied() {
        let settings = configuration_from(lookup(&[
            ("ENV_STATE", "prod"),
            ("HTTP_PORT", "9000"),
            ("LOG_FILE", "/var/log/app.log"),
            ("LOG_MAX_BYTES", "2048"),
            ("LOG_BACKUP_COUNT", "2"),
        ]))
        .unwrap();
        assert_eq!(settings.http_port, 9000);
        assert_eq!(settings.log.log_file, PathBuf::from("/var/log/app.log"));
        assert_eq!(settings.log.max_bytes, 2048);
        assert_eq!(settings.log.backup_count, 2);
    }

    #[test]
    fn test_invalid_port_value_fails() {
        let err =
            configuration_from(lookup(&[("ENV_STATE", "dev"), ("HTTP_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("HTTP_PORT"));
    }

    #[test]
    fn test_zero_port_fails() {
        let err = configuration_from(lookup(&[("ENV_STATE", "dev"), ("HTTP_PORT", "0")])).unwrap_err();
        assert!(err.to_string().contains("Port cannot be 0"));
    }

    #[test]
    fn test_http_port_without_profile() {
        assert_eq!(http_port_from(lookup(&[])).unwrap(), 8000);
        assert_eq!(http_port_from(lookup(&[("HTTP_PORT", "9100")])).unwrap(), 9100);
        assert!(http_port_from(lookup(&[("HTTP_PORT", "0")])).is_err());
    }

    #[test]
    fn test_zero_max_bytes_fails() {
        let result = configuration_from(lookup(&[("ENV_STATE", "dev"), ("LOG_MAX_BYTES", "0")]));
        assert!(result.is_err());
    }
}
