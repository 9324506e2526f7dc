//! Static provider tables: credential variables, base-URL variables and
//! model-name hints.
//!
//! Everything here is `const` data and safe to read from anywhere.

use super::kind::ProviderKind;

/// Credential variable per provider, scanned during auto-discovery.
///
/// Ollama is absent on purpose: it needs no key and is only reached through
/// the unified variables or a profile.
pub const CREDENTIAL_VARS: &[(ProviderKind, &str)] = &[
    (ProviderKind::OpenAI, "OPENAI_API_KEY"),
    (ProviderKind::Anthropic, "ANTHROPIC_API_KEY"),
    (ProviderKind::Google, "GOOGLE_API_KEY"),
    (ProviderKind::AzureOpenAI, "AZURE_OPENAI_API_KEY"),
    (ProviderKind::OpenRouter, "OPENROUTER_API_KEY"),
    (ProviderKind::Groq, "GROQ_API_KEY"),
    (ProviderKind::Mistral, "MISTRAL_API_KEY"),
    (ProviderKind::Together, "TOGETHER_API_KEY"),
    (ProviderKind::Cohere, "COHERE_API_KEY"),
];

/// Provider-specific base-URL override variables.
pub const BASE_URL_VARS: &[(ProviderKind, &str)] = &[
    (ProviderKind::OpenAI, "OPENAI_BASE_URL"),
    (ProviderKind::Ollama, "OLLAMA_BASE_URL"),
];

/// `(model-name prefix, provider)` hints, checked in this order; the first
/// match wins.
///
/// `gpt-` shadows `gpt-4` today. Both map to OpenAI so the outcome is the
/// same, but lookups are order-sensitive rather than longest-prefix.
pub const MODEL_HINTS: &[(&str, ProviderKind)] = &[
    ("gpt-", ProviderKind::OpenAI),
    ("o4", ProviderKind::OpenAI),
    ("gpt4", ProviderKind::OpenAI),
    ("gpt-4", ProviderKind::OpenAI),
    ("claude", ProviderKind::Anthropic),
    ("gemini", ProviderKind::Google),
    ("mistral", ProviderKind::Mistral),
    ("mixtral", ProviderKind::Mistral),
    // also served by openrouter and together; groq is the guess
    ("llama", ProviderKind::Groq),
];

/// Returns the credential variable for `provider`, if it has one.
pub fn credential_var(provider: ProviderKind) -> Option<&'static str> {
    lookup(CREDENTIAL_VARS, provider)
}

/// Returns the base-URL override variable for `provider`, if it has one.
pub fn base_url_var(provider: ProviderKind) -> Option<&'static str> {
    lookup(BASE_URL_VARS, provider)
}

/// All credential variable names, sorted, for "set one of ..." messages.
pub fn credential_var_names() -> Vec<String> {
    let mut names: Vec<String> = CREDENTIAL_VARS
        .iter()
        .map(|(_, var)| var.to_string())
        .collect();
    names.sort();
    names
}

/// Infers a provider from a model name using [`MODEL_HINTS`].
///
/// Matching is case-insensitive; hints are tried in declaration order.
pub fn infer_provider(model: &str) -> Option<ProviderKind> {
    let lower = model.to_lowercase();
    MODEL_HINTS
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, provider)| *provider)
}

fn lookup(table: &[(ProviderKind, &'static str)], provider: ProviderKind) -> Option<&'static str> {
    table
        .iter()
        .find(|(kind, _)| *kind == provider)
        .map(|(_, var)| *var)
}
