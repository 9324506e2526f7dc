//! Provider resolution for nuro.
//!
//! Decides which provider, model and credential to use from the `--model`
//! argument and an [`Environment`] snapshot. Precedence, first match wins:
//!
//!   1. `NURO_API_KEY` set: unified variables decide everything, provider
//!      keys are ignored.
//!   2. Otherwise: auto-discover provider keys, prefer OpenAI, else the
//!      alphabetically first; a `--model` with a known prefix re-routes to
//!      its provider when that provider's key is present.
//!
//! `--model '$VAR'` reads the model id from `VAR` first.

use std::fmt;

use tracing::debug;

use super::catalog::{
    base_url_var, credential_var, credential_var_names, infer_provider, CREDENTIAL_VARS,
};
use super::kind::ProviderKind;
use crate::constants::{ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_PROVIDER, MODEL_ENV_SIGIL};
use crate::env::Environment;
use crate::error::ResolveError;

/// The provider, model and credential chosen for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub provider: ProviderKind,
    /// Never empty.
    pub model: String,
    pub credential: String,
    pub base_url: Option<String>,
    /// Variable the credential came from, for diagnostics.
    pub credential_source: String,
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTarget")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("credential", &"***")
            .field("base_url", &self.base_url)
            .field("credential_source", &self.credential_source)
            .finish()
    }
}

/// Resolve which provider and model to use.
///
/// `model_arg` is the raw `--model` value and may be empty. Reads `env`
/// only; nothing is written back.
pub fn resolve(model_arg: &str, env: &Environment) -> Result<ResolvedTarget, ResolveError> {
    let cli_model = expand_model_arg(model_arg, env)?;

    let target = match env.get(ENV_API_KEY) {
        Some(key) => resolve_unified(key, cli_model, env)?,
        None => auto_discover(cli_model, env)?,
    };

    debug!(
        provider = %target.provider,
        model = %target.model,
        source = %target.credential_source,
        base_url = ?target.base_url,
        "resolved provider"
    );
    Ok(target)
}

/// Expands `$VAR` indirection; an empty argument means "not given".
fn expand_model_arg(model_arg: &str, env: &Environment) -> Result<Option<String>, ResolveError> {
    if model_arg.is_empty() {
        return Ok(None);
    }
    match model_arg.strip_prefix(MODEL_ENV_SIGIL) {
        Some(var) => env
            .get(var)
            .map(|model| Some(model.to_string()))
            .ok_or_else(|| ResolveError::ModelEnvUnset(var.to_string())),
        None => Ok(Some(model_arg.to_string())),
    }
}

fn resolve_unified(
    key: &str,
    cli_model: Option<String>,
    env: &Environment,
) -> Result<ResolvedTarget, ResolveError> {
    let model = cli_model.or_else(|| env.get(ENV_MODEL).map(String::from));

    let provider = match env.get(ENV_PROVIDER) {
        Some(name) => name.parse()?,
        None => model
            .as_deref()
            .and_then(infer_provider)
            .unwrap_or(ProviderKind::OpenAI),
    };

    let model = match model {
        Some(model) => model,
        None if provider == ProviderKind::OpenAI => provider.default_model().to_string(),
        None => return Err(ResolveError::NoModel),
    };

    let base_url = env
        .get(ENV_BASE_URL)
        .or_else(|| base_url_var(provider).and_then(|var| env.get(var)))
        .map(String::from);

    Ok(ResolvedTarget {
        provider,
        model,
        credential: key.to_string(),
        base_url,
        credential_source: ENV_API_KEY.to_string(),
    })
}

fn auto_discover(
    cli_model: Option<String>,
    env: &Environment,
) -> Result<ResolvedTarget, ResolveError> {
    let found: Vec<(ProviderKind, &str, &str)> = CREDENTIAL_VARS
        .iter()
        .filter_map(|(kind, var)| env.get(var).map(|key| (*kind, *var, key)))
        .collect();

    // Prefer OpenAI if present, else alphabetical by provider name
    let mut chosen = found
        .iter()
        .find(|(kind, _, _)| *kind == ProviderKind::OpenAI)
        .or_else(|| found.iter().min_by_key(|(kind, _, _)| kind.as_str()))
        .copied()
        .ok_or_else(|| ResolveError::NoCredentials(credential_var_names()))?;

    if let Some(model) = cli_model.as_deref() {
        if let Some(inferred) = infer_provider(model) {
            chosen = found
                .iter()
                .find(|(kind, _, _)| *kind == inferred)
                .copied()
                .ok_or_else(|| ResolveError::MissingCredential {
                    model: model.to_string(),
                    provider: inferred.to_string(),
                    env: credential_var(inferred).unwrap_or_default().to_string(),
                })?;
        }
    }

    let (provider, var, key) = chosen;
    Ok(ResolvedTarget {
        provider,
        model: cli_model.unwrap_or_else(|| provider.default_model().to_string()),
        credential: key.to_string(),
        base_url: base_url_var(provider)
            .and_then(|v| env.get(v))
            .map(String::from),
        credential_source: var.to_string(),
    })
}
