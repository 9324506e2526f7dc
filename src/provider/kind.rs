//! Provider kind enumeration and default model mapping.
//!
//! Defines [`ProviderKind`] which identifies which LLM backend to use,
//! and [`ProviderKind::default_model`] which returns the fallback model when
//! none was requested.

use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;

/// Identifies which LLM provider to use.
///
/// Only [`ProviderKind::OpenAI`] and [`ProviderKind::Ollama`] have backends;
/// the rest are recognised so resolution can name them in errors and
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    /// OpenAI (chat completions or the Responses API).
    OpenAI,
    /// Ollama (local models via the native generate API).
    Ollama,
    /// Anthropic (Claude models).
    Anthropic,
    /// Google (Gemini models).
    Google,
    /// Azure-hosted OpenAI deployments.
    AzureOpenAI,
    /// OpenRouter (multi-provider gateway).
    OpenRouter,
    Groq,
    Mistral,
    Together,
    Cohere,
}

impl ProviderKind {
    /// Every known provider, in declaration order.
    pub const ALL: [ProviderKind; 10] = [
        Self::OpenAI,
        Self::Ollama,
        Self::Anthropic,
        Self::Google,
        Self::AzureOpenAI,
        Self::OpenRouter,
        Self::Groq,
        Self::Mistral,
        Self::Together,
        Self::Cohere,
    ];

    /// The lower-case name used in environment variables and profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::AzureOpenAI => "azureopenai",
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::Together => "together",
            Self::Cohere => "cohere",
        }
    }

    /// Returns the model used when the caller did not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => crate::constants::DEFAULT_OPENAI_MODEL,
            Self::Ollama => crate::constants::OLLAMA_DEFAULT_MODEL,
            Self::Anthropic => "claude-3-5-sonnet",
            Self::Google => "gemini-1.5-pro",
            Self::AzureOpenAI => "gpt-4o-mini",
            Self::OpenRouter => "openrouter/auto",
            Self::Groq => "llama3-70b-8192",
            Self::Mistral => "mistral-large-latest",
            Self::Together => "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
            Self::Cohere => "command-r-plus",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ResolveError;

    /// Parses a provider name. Matching is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ResolveError::UnknownProvider(s.to_string()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAI));
        assert_eq!("ollama".parse::<ProviderKind>(), Ok(ProviderKind::Ollama));
        assert_eq!(
            "AzureOpenAI".parse::<ProviderKind>(),
            Ok(ProviderKind::AzureOpenAI)
        );
    }

    #[test]
    fn unknown_provider_is_an_error() {
        assert_eq!(
            "bedrock".parse::<ProviderKind>(),
            Err(ResolveError::UnknownProvider("bedrock".into()))
        );
    }

    #[test]
    fn every_name_parses_back() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
    }

    #[test]
    fn openai_default_model() {
        assert_eq!(ProviderKind::OpenAI.default_model(), "gpt-4o-mini");
        assert_eq!(ProviderKind::Groq.default_model(), "llama3-70b-8192");
    }
}
