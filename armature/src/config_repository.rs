//! Application configuration aggregated from a directory of config files. Every file becomes a
//! section named after its file stem, so `config/database.toml` is available as the `database`
//! section. Files sharing a stem are merged, in file name order.
//!
//! The bootstrapper binds the repository as a singleton under [CONFIG_KEY]:
//!
//! ```
//! use armature::config_repository::{ConfigRepository, CONFIG_KEY};
//! use armature_di::binding::Resolver;
//! use armature_di::container::Container;
//!
//! let mut container = Container::default();
//! container
//!     .singleton(CONFIG_KEY, Resolver::value(ConfigRepository::default()))
//!     .unwrap();
//!
//! let config = container.resolve_typed::<ConfigRepository>(CONFIG_KEY).unwrap();
//! assert!(config.section("database").is_none());
//! ```

use config::{Config, ConfigError, File, Value};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Key of the [ConfigRepository] binding.
pub const CONFIG_KEY: &str = "config";

const SUPPORTED_EXTENSIONS: [&str; 7] = ["json", "json5", "toml", "yaml", "yml", "ini", "ron"];

#[derive(Error, Debug)]
pub enum ConfigRepositoryError {
    #[error("Cannot read config directory {}: {source}", .path.display())]
    Directory { path: PathBuf, source: io::Error },
    #[error("Error in config section '{section}': {source}")]
    Section {
        section: String,
        source: ConfigError,
    },
    #[error("Config section not found: {0}")]
    MissingSection(String),
}

/// Mapping from section names to their config values.
#[derive(Clone, Debug, Default)]
pub struct ConfigRepository {
    sections: BTreeMap<String, Value>,
}

impl ConfigRepository {
    /// Loads all supported files from given directory. Files with unknown extensions and
    /// subdirectories are skipped.
    pub fn load<P: AsRef<Path>>(directory: P) -> Result<Self, ConfigRepositoryError> {
        let directory = directory.as_ref();
        let directory_error = |source| ConfigRepositoryError::Directory {
            path: directory.to_path_buf(),
            source,
        };

        let files: Vec<PathBuf> = directory
            .read_dir()
            .map_err(directory_error)?
            .map_ok(|entry| entry.path())
            .try_collect()
            .map_err(directory_error)?;

        let sections = files
            .into_iter()
            .filter(|path| path.is_file() && Self::is_supported(path))
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                Some((stem, path))
            })
            .sorted()
            .group_by(|(stem, _)| stem.clone())
            .into_iter()
            .map(|(section, files)| {
                let value = files
                    .fold(Config::builder(), |builder, (_, path)| {
                        builder.add_source(File::from(path))
                    })
                    .build()
                    .and_then(|config| config.try_deserialize::<Value>())
                    .map_err(|source| ConfigRepositoryError::Section {
                        section: section.clone(),
                        source,
                    })?;

                debug!(%section, "Loaded config section.");
                Ok((section, value))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigRepositoryError>>()?;

        Ok(Self { sections })
    }

    #[inline]
    pub fn from_sections(sections: BTreeMap<String, Value>) -> Self {
        Self { sections }
    }

    /// Returns the raw value of given section.
    #[inline]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Deserializes given section.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigRepositoryError> {
        self.section(name)
            .cloned()
            .ok_or_else(|| ConfigRepositoryError::MissingSection(name.to_string()))?
            .try_deserialize()
            .map_err(|source| ConfigRepositoryError::Section {
                section: name.to_string(),
                source,
            })
    }

    /// Returns all section names, in order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| SUPPORTED_EXTENSIONS.contains(&extension))
            .unwrap_or(false)
    }
}
