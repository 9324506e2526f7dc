//! File loading and validation for nuro profile files.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::ProfileFile;
use crate::error::ConfigError;
use crate::provider::ProviderKind;

impl ProfileFile {
    /// Reads, parses and validates the profile file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ProfileFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.validate()?;
        debug!(path = %path.display(), profiles = file.profiles.len(), "loaded profile file");
        Ok(file)
    }

    /// Finds and loads the profile file, if there is one.
    ///
    /// See [`ProfileFile::locate`] for the lookup order. No file is not an
    /// error.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let Some(path) = Self::locate(explicit, &cwd, Self::global_path()) else {
            debug!("no profile file found");
            return Ok(None);
        };
        let file = Self::load_from(&path)?;
        Ok(Some((path, file)))
    }

    /// Checks the default profile exists and every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(default) = &self.default {
            if !self.profiles.contains_key(default) {
                return Err(ConfigError::Invalid(format!(
                    "default profile '{default}' not found in 'profiles'"
                )));
            }
        }

        for (name, profile) in &self.profiles {
            if let Some(provider) = &profile.provider {
                if provider.parse::<ProviderKind>().is_err() {
                    let known: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
                    return Err(ConfigError::Invalid(format!(
                        "invalid provider '{provider}' in profile '{name}': must be one of {}",
                        known.join(", ")
                    )));
                }
            }
            if profile.max_tokens.is_some_and(|n| n < 0) {
                return Err(ConfigError::Invalid(format!(
                    "max_tokens in profile '{name}' must be non-negative"
                )));
            }
            if outside(profile.temperature, 0.0..=2.0) {
                return Err(ConfigError::Invalid(format!(
                    "temperature in profile '{name}' must be between 0 and 2"
                )));
            }
            if outside(profile.top_p, 0.0..=1.0) {
                return Err(ConfigError::Invalid(format!(
                    "top_p in profile '{name}' must be between 0 and 1"
                )));
            }
        }
        Ok(())
    }
}

/// True when a value is set and falls outside `range`.
fn outside(value: Option<f64>, range: RangeInclusive<f64>) -> bool {
    value.is_some_and(|v| !range.contains(&v))
}
