//! Configuration for the Archipelago island runtime.
//!
//! Read from `$ARCHIPELAGO_CONFIG` when set, otherwise
//! `~/.archipelago/config.toml`. A missing file is not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use archipelago_types::{AdapterKind, Priority};
use serde::Deserialize;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ARCHIPELAGO_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct ArchipelagoConfig {
    pub islands: Option<IslandsConfig>,
    /// Components keyed by registry name.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IslandsConfig {
    pub container_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComponentConfig {
    #[serde(default = "default_adapter")]
    pub adapter: AdapterKind,
    /// `{prop}` template rendered by the markup adapter.
    pub template: Option<String>,
    pub ssr: Option<bool>,
    pub hydrate: Option<bool>,
    pub priority: Option<Priority>,
}

const fn default_adapter() -> AdapterKind {
    AdapterKind::Vanilla
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl ArchipelagoConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match Self::from_toml_str(&content) {
            Ok(config) => {
                tracing::debug!(
                    path = %path.display(),
                    components = config.components.len(),
                    "Loaded config"
                );
                Ok(Some(config))
            }
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Configured container prefix, if one is set and non-empty.
    #[must_use]
    pub fn container_prefix(&self) -> Option<&str> {
        self.islands
            .as_ref()
            .and_then(|islands| islands.container_prefix.as_deref())
            .filter(|prefix| !prefix.is_empty())
    }

    /// Components the markup adapter can render: vanilla kind with a template.
    pub fn markup_components(&self) -> impl Iterator<Item = (&str, &ComponentConfig, &str)> {
        self.components.iter().filter_map(|(name, component)| {
            match (&component.adapter, component.template.as_deref()) {
                (AdapterKind::Vanilla, Some(template)) => Some((name.as_str(), component, template)),
                _ => None,
            }
        })
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".archipelago").join("config.toml"))
}
