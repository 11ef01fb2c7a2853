//! Layered configuration loading
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults for the detected environment
//! 2. A TOML file (`config.<environment>.toml` unless a path is given)
//! 3. `EV__`-prefixed environment variables, after `.env` files are loaded
//!
//! Nested keys use a double underscore, e.g. `EV__VERIFICATION__COOLDOWN_SECONDS=30`
//! or `EV__BACKEND__PROVIDER=graphql`.

use std::path::Path;

use config::{Config, File};
use ev_shared::config::{AppConfig, Environment};
use tracing::debug;

use crate::InfrastructureError;

/// Prefix of environment variables that override configuration
pub const ENV_PREFIX: &str = "EV";

const ENV_SEPARATOR: &str = "__";

/// Load the application configuration
///
/// # Arguments
///
/// * `path` - TOML file to read; defaults to the environment's config file, which may be absent
///
/// # Errors
///
/// * `Config` - A source could not be read or the merged values do not deserialize
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    let environment = Environment::from_env();
    dotenvy::from_filename(environment.env_file()).ok();

    build_config(environment, path, ENV_PREFIX)
}

fn build_config(
    environment: Environment,
    path: Option<&Path>,
    prefix: &str,
) -> Result<AppConfig, InfrastructureError> {
    let defaults = Config::try_from(&AppConfig::for_environment(environment))?;

    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(&environment.config_file()).required(false),
    };

    let config: AppConfig = Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    if config.verification.work_email_domains.is_empty() {
        return Err(InfrastructureError::Config(
            "verification.work_email_domains must not be empty".to_string(),
        ));
    }

    debug!(
        environment = %config.environment,
        backend = ?config.backend.provider,
        cooldown_seconds = config.verification.cooldown_seconds,
        event = "config_loaded",
        "Configuration loaded"
    );
    Ok(config)
}
