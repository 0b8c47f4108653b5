//! Layered configuration for the departure monitor CLI

use std::path::Path;

use integration_efa::EfaConfig;

/// Prefix of environment variables overriding configuration keys
pub const ENV_PREFIX: &str = "EFA";

/// Load the EFA configuration
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at
/// `path` (or an optional `efa.toml` in the working directory), and
/// environment variables such as `EFA_BASE_URL` or `EFA_TIMEOUT_SECS`.
pub fn load(path: Option<&Path>) -> Result<EfaConfig, config::ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("efa").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    builder.build()?.try_deserialize()
}
