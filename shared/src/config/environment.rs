//! Deployment environment and log output settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Variables checked, in order, when detecting the environment
const ENVIRONMENT_VARS: [&str; 3] = ["ENVIRONMENT", "ENV", "RUST_ENV"];

/// Deployment environment, selecting presets and per-environment files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// First parseable value among `ENVIRONMENT`, `ENV` and `RUST_ENV`; development otherwise
    pub fn from_env() -> Self {
        ENVIRONMENT_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find_map(|value| value.parse().ok())
            .unwrap_or_default()
    }

    fn name(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Optional TOML file layered over the built-in defaults
    pub fn config_file(self) -> String {
        format!("config.{}.toml", self.name())
    }

    /// Optional dotenv file loaded after `.env`
    pub fn env_file(self) -> String {
        format!(".env.{}", self.name())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" | "test" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// How verification events are written by the tracing subscriber
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive, used when `RUST_LOG` is unset
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// ANSI colours for the pretty and compact formats
    #[serde(default = "default_colored")]
    pub colored: bool,

    /// Adds file and line to pretty and JSON output
    #[serde(default)]
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: LogFormat::default(),
            colored: default_colored(),
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Pretty debug output in development, JSON elsewhere
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: String::from("ev_core=debug,ev_infra=debug,info"),
                source_location: true,
                ..Self::default()
            },
            Environment::Staging | Environment::Production => Self {
                level: String::from(if env == Environment::Staging { "info" } else { "warn" }),
                format: LogFormat::Json,
                colored: false,
                source_location: false,
            },
        }
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

fn default_colored() -> bool {
    true
}
