//! Framework configuration. [ApplicationConfig] is created with opinionated default values, which
//! can then be overwritten by environment variables prefixed with `ARMATURE_` or the
//! `armature.json` file.
//!
//! Recognized values:
//!
//! * `install_tracing_logger` - install a default `tracing` subscriber during bootstrap
//! * `config_directory` - directory loaded into the
//! [ConfigRepository](crate::config_repository::ConfigRepository)
//! * `providers` - explicit, ordered list of provider names to run; comma-separated when given
//! as an environment variable

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "ARMATURE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "armature.json";

/// Framework configuration used by the [Application](crate::application::Application).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Directory with application config files. No config is loaded when empty.
    pub config_directory: Option<String>,
    /// Names of providers to run, in order. All discovered providers run when empty.
    pub providers: Option<Vec<String>>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            config_directory: None,
            providers: None,
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            config_directory: value.config_directory.or(default.config_directory),
            providers: value.providers.or(default.providers),
        }
    }
}

impl ApplicationConfig {
    /// Loads the config from the default config file and environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("providers"),
            )
            .build()
            .and_then(|config| config.try_deserialize::<OptionalApplicationConfig>())
            .map(|config| config.into())
    }

    pub fn with_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }

    pub fn with_config_directory<T: ToString>(mut self, config_directory: T) -> Self {
        self.config_directory = Some(config_directory.to_string());
        self
    }

    pub fn with_providers<T: ToString>(mut self, providers: &[T]) -> Self {
        self.providers = Some(providers.iter().map(ToString::to_string).collect());
        self
    }
}

#[derive(Deserialize, Default)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    config_directory: Option<String>,
    providers: Option<Vec<String>>,
}
