//! Struct definitions for nuro profile files.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// A profile file, deserialized from TOML.
///
/// ```toml
/// default = "local"
///
/// [profiles.local]
/// provider = "ollama"
/// model = "llama3.1:8b"
/// ```
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ProfileFile {
    /// Profile used when `--profile` is not given.
    #[serde(default)]
    pub default: Option<String>,
    /// Named profiles, ordered by name.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// One named set of connection and sampling defaults.
///
/// `api_key`, `base_url` and `model` may reference environment variables
/// as `$VAR` or `${VAR}`.
#[derive(Default, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Provider name, e.g. `"openai"` or `"ollama"`.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .finish()
    }
}
