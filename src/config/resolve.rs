//! Profile selection, `$VAR` substitution and application.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::types::{Profile, ProfileFile};
use crate::constants::{
    ENV_API_KEY, ENV_BASE_URL, ENV_MAX_TOKENS, ENV_MODEL, ENV_PROVIDER, ENV_TEMPERATURE, ENV_TOP_P,
};
use crate::env::Environment;
use crate::error::ConfigError;

/// Matches `${VAR}` or `$VAR`.
static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env reference pattern is valid")
});

impl ProfileFile {
    /// Chooses the profile to apply.
    ///
    /// `--profile` first, then `default`, then the alphabetically first
    /// profile. `Ok(None)` when no profile was requested and none exist.
    pub fn select(&self, requested: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        if let Some(name) = requested {
            if self.profiles.is_empty() {
                return Err(ConfigError::NoProfiles);
            }
            return self
                .profiles
                .get_key_value(name)
                .map(|(name, profile)| Some((name.as_str(), profile)))
                .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()));
        }

        if let Some(default) = &self.default {
            return self
                .profiles
                .get_key_value(default)
                .map(|(name, profile)| Some((name.as_str(), profile)))
                .ok_or_else(|| ConfigError::ProfileNotFound(default.clone()));
        }

        Ok(self
            .profiles
            .first_key_value()
            .map(|(name, profile)| (name.as_str(), profile)))
    }
}

impl Profile {
    /// Copy with `$VAR` / `${VAR}` references in `api_key`, `base_url` and
    /// `model` replaced from `env`. Unresolved references are kept verbatim.
    pub fn substituted(&self, env: &Environment) -> Profile {
        let expand = |value: &Option<String>| value.as_deref().map(|v| substitute(v, env));
        Profile {
            api_key: expand(&self.api_key),
            base_url: expand(&self.base_url),
            model: expand(&self.model),
            ..self.clone()
        }
    }

    /// Writes this profile into the unified `NURO_*` variables of `env`.
    ///
    /// Only non-empty strings and positive numbers are written, so unset
    /// fields leave existing values alone.
    pub fn apply(&self, env: &mut Environment) {
        let strings = [
            (ENV_API_KEY, &self.api_key),
            (ENV_BASE_URL, &self.base_url),
            (ENV_PROVIDER, &self.provider),
            (ENV_MODEL, &self.model),
        ];
        for (var, value) in strings {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                env.set(var, value);
            }
        }

        if let Some(n) = self.max_tokens.filter(|n| *n > 0) {
            env.set(ENV_MAX_TOKENS, n.to_string());
        }
        if let Some(t) = self.temperature.filter(|t| *t > 0.0) {
            env.set(ENV_TEMPERATURE, format!("{t:.2}"));
        }
        if let Some(p) = self.top_p.filter(|p| *p > 0.0) {
            env.set(ENV_TOP_P, format!("{p:.2}"));
        }
    }
}

/// Selects a profile, substitutes references and applies it to `env`.
///
/// Returns the applied profile's name.
pub fn apply_profile(
    file: &ProfileFile,
    requested: Option<&str>,
    env: &mut Environment,
) -> Result<Option<String>, ConfigError> {
    let Some((name, profile)) = file.select(requested)? else {
        return Ok(None);
    };
    let resolved = profile.substituted(env);
    debug!(profile = name, ?resolved, "applying profile");
    resolved.apply(env);
    Ok(Some(name.to_string()))
}

fn substitute(value: &str, env: &Environment) -> String {
    ENV_REFERENCE
        .replace_all(value, |caps: &Captures<'_>| {
            let name = caps.get(1).or(caps.get(2)).map_or("", |m| m.as_str());
            env.get(name).unwrap_or(&caps[0]).to_string()
        })
        .into_owned()
}
