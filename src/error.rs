//! Error types for nuro.
//!
//! The core returns typed errors; the CLI layer wraps them in [`anyhow`] and
//! uses [`exit_code`] to pick the process exit status from the root cause.

use std::path::PathBuf;

use thiserror::Error;

use crate::completion::Completion;

/// Bad command-line input, detected before any resolution happens.
#[derive(Error, Debug)]
#[error("usage error: {0}")]
pub struct UsageError(pub String);

/// Failures while loading or validating a profile file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for the profile schema.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A profile value is out of range or unknown.
    #[error("{0}")]
    Invalid(String),

    /// `--profile` or `default` names a profile that does not exist.
    #[error("profile '{0}' not found in config")]
    ProfileNotFound(String),

    /// `--profile` was given but there is nothing to choose from.
    #[error("no profiles defined in config")]
    NoProfiles,
}

/// Failures deciding which provider, model and credential to use.
///
/// All of these are reported before any network call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The unified credential was set for a non-OpenAI provider without a model.
    #[error("no model specified; set --model or NURO_MODEL")]
    NoModel,

    /// `--model '$VAR'` referenced a variable that is unset or empty.
    #[error("model env '{0}' is empty or unset")]
    ModelEnvUnset(String),

    /// Auto-discovery found no provider credential at all.
    #[error("no provider keys found. Set NURO_API_KEY/NURO_MODEL or one of: {}", .0.join(", "))]
    NoCredentials(Vec<String>),

    /// The model name implies a provider whose credential is not set.
    #[error("model '{model}' implies provider '{provider}' but no {env} key found")]
    MissingCredential {
        model: String,
        provider: String,
        env: String,
    },

    /// `NURO_PROVIDER` or a profile named a provider nuro does not know.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// The provider is known but has no backend yet.
    #[error("provider '{0}' not implemented yet; set NURO_PROVIDER=openai or provide OPENAI_API_KEY")]
    NotImplemented(String),
}

/// Failures raised by the HTTP transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent (DNS, connect, TLS).
    #[error("request failed: {0}")]
    Connect(String),

    /// The server answered with a non-2xx status.
    #[error("{status} - {body}")]
    Status { status: String, body: String },

    /// Reading the response body failed part way.
    #[error("stream read error: {0}")]
    Read(String),
}

/// Failures while producing a completion.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Connection or body read failure.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response; `body` is already trimmed and truncated.
    #[error("{backend} error: {status} - {body}")]
    Status {
        backend: &'static str,
        status: String,
        body: String,
    },

    /// The request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The non-streaming response body was not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A chat-completions response carried no choices.
    #[error("{0}: no choices returned")]
    NoChoices(&'static str),

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,

    /// The per-call deadline passed.
    #[error("request timed out")]
    DeadlineExceeded,

    /// A stream failed after it started; `partial` holds what arrived.
    #[error("{cause}")]
    Interrupted {
        partial: Completion,
        cause: Box<CompletionError>,
    },
}

impl CompletionError {
    /// Maps a transport failure onto the error reported for `backend`.
    pub fn from_transport(backend: &'static str, err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => Self::Status {
                backend,
                status,
                body,
            },
            other => Self::Transport(other.to_string()),
        }
    }

    /// Wraps a mid-stream failure together with the text received so far.
    pub fn interrupted(partial: Completion, source: CompletionError) -> Self {
        Self::Interrupted {
            partial,
            cause: Box::new(source),
        }
    }

    /// Whether the root cause is cancellation or an expired deadline.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled | Self::DeadlineExceeded => true,
            Self::Interrupted { cause, .. } => cause.is_cancelled(),
            _ => false,
        }
    }

    /// Text and usage received before a stream failed, if any.
    pub fn partial(&self) -> Option<&Completion> {
        match self {
            Self::Interrupted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Process exit status for an error returned by the CLI layer.
///
/// Usage and config problems exit 2, resolution problems 3, completion
/// failures 4, anything else 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<UsageError>() || cause.is::<ConfigError>() {
            return 2;
        }
        if cause.is::<ResolveError>() {
            return 3;
        }
        if cause.is::<CompletionError>() {
            return 4;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Usage;

    #[test]
    fn display_usage_error() {
        let err = UsageError("test".into());
        assert_eq!(err.to_string(), "usage error: test");
    }

    #[test]
    fn display_no_credentials_lists_variables() {
        let err = ResolveError::NoCredentials(vec!["A_KEY".into(), "B_KEY".into()]);
        assert_eq!(
            err.to_string(),
            "no provider keys found. Set NURO_API_KEY/NURO_MODEL or one of: A_KEY, B_KEY"
        );
    }

    #[test]
    fn display_status_error() {
        let err = CompletionError::from_transport(
            "ollama",
            TransportError::Status {
                status: "404 Not Found".into(),
                body: "model not found".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "ollama error: 404 Not Found - model not found"
        );
    }

    #[test]
    fn interrupted_cancellation_is_cancelled() {
        let partial = Completion {
            text: "Hel".into(),
            usage: Usage::default(),
        };
        let err = CompletionError::interrupted(partial, CompletionError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.partial().map(|c| c.text.as_str()), Some("Hel"));
        assert_eq!(err.to_string(), "request cancelled");
    }

    #[test]
    fn transport_failure_is_not_cancelled() {
        let err = CompletionError::Transport("reset".into());
        assert!(!err.is_cancelled());
        assert!(err.partial().is_none());
    }

    #[test]
    fn exit_codes_follow_root_cause() {
        let usage = anyhow::Error::new(UsageError("x".into()));
        assert_eq!(exit_code(&usage), 2);

        let resolve = anyhow::Error::new(ResolveError::NoModel).context("resolving provider");
        assert_eq!(exit_code(&resolve), 3);

        let completion = anyhow::Error::new(CompletionError::Cancelled);
        assert_eq!(exit_code(&completion), 4);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
