//! Completion backends for nuro.
//!
//! A [`Backend`] turns a [`CompletionRequest`] into a [`Completion`], either
//! in one piece or as a stream of text deltas. Three variants exist:
//! OpenAI chat completions, the OpenAI Responses API and Ollama's native
//! generate API. [`build_backend`] picks one from a resolved target.

pub mod context;
mod ollama;
mod openai_chat;
mod openai_responses;
pub mod prompt;
pub mod stream;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{LOG_BODY_LIMIT, RESPONSES_MODEL_PREFIXES};
use crate::error::{CompletionError, ResolveError};
use crate::provider::{ProviderKind, ResolvedTarget};

pub use context::CallContext;
pub use ollama::Ollama;
pub use openai_chat::OpenAiChat;
pub use openai_responses::OpenAiResponses;
pub use transport::{HttpTransport, Transport};

/// Input to a single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub data: String,
    /// Zero means "let the backend decide".
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub stream: bool,
    /// Zero means no deadline.
    pub timeout: Duration,
}

/// Token counts reported by a backend. All zero when it reports none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(skip_serializing_if = "is_zero")]
    pub prompt_tokens: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub completion_tokens: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_tokens: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Final text and usage of a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

/// A completion backend.
///
/// `stream` calls `on_delta` synchronously, in arrival order, from the task
/// reading the response; the returned text is the concatenation of every
/// delta.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Provider name reported to the user.
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        ctx: &CallContext,
        request: &CompletionRequest,
    ) -> Result<Completion, CompletionError>;

    async fn stream(
        &self,
        ctx: &CallContext,
        request: &CompletionRequest,
        on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<Completion, CompletionError>;
}

/// Whether `model` is served through the Responses API rather than chat
/// completions.
pub fn uses_responses_api(model: &str) -> bool {
    let model = model.trim().to_lowercase();
    RESPONSES_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Creates the backend for a resolved target.
///
/// Providers without a backend fail with [`ResolveError::NotImplemented`].
pub fn build_backend(
    target: &ResolvedTarget,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn Backend>, ResolveError> {
    let base_url = target.base_url.as_deref();
    match target.provider {
        ProviderKind::OpenAI if uses_responses_api(&target.model) => Ok(Box::new(
            OpenAiResponses::new(&target.credential, base_url, transport),
        )),
        ProviderKind::OpenAI => Ok(Box::new(OpenAiChat::new(
            &target.credential,
            base_url,
            transport,
        ))),
        ProviderKind::Ollama => Ok(Box::new(Ollama::new(base_url, transport))),
        other => Err(ResolveError::NotImplemented(other.to_string())),
    }
}

/// Joins a base URL and an endpoint path, dropping trailing slashes.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Logs an outgoing request body, truncated.
fn log_request(label: &str, url: &str, body: &serde_json::Value) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let body = body.to_string();
    let body = match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body,
    };
    debug!(backend = label, url, %body, "sending request");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::transport::testing::ScriptedTransport;

    fn target(provider: ProviderKind, model: &str) -> ResolvedTarget {
        ResolvedTarget {
            provider,
            model: model.into(),
            credential: "key".into(),
            base_url: None,
            credential_source: "NURO_API_KEY".into(),
        }
    }

    pub(crate) fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.into(),
            prompt: "count words".into(),
            data: "one two".into(),
            max_tokens: 0,
            temperature: 0.7,
            top_p: 1.0,
            stream: false,
            timeout: Duration::ZERO,
        }
    }

    #[test]
    fn responses_api_prefixes() {
        assert!(uses_responses_api("o1-mini"));
        assert!(uses_responses_api("GPT-4.1-nano"));
        assert!(uses_responses_api(" gpt-5 "));
        assert!(!uses_responses_api("gpt-4o-mini"));
        assert!(!uses_responses_api("o4-mini"));
        assert!(!uses_responses_api(""));
    }

    #[tokio::test]
    async fn openai_models_route_to_matching_endpoint() {
        let cases = [
            ("gpt-4o-mini", "https://api.openai.com/v1/chat/completions"),
            ("gpt-4.1", "https://api.openai.com/v1/responses"),
            ("o1-preview", "https://api.openai.com/v1/responses"),
        ];
        for (model, url) in cases {
            let transport = Arc::new(ScriptedTransport::chunks([]));
            let backend =
                build_backend(&target(ProviderKind::OpenAI, model), transport.clone()).unwrap();
            assert_eq!(backend.name(), "openai");
            let _ = backend
                .stream(
                    &CallContext::background(),
                    &request(model),
                    &mut |_: &str| {},
                )
                .await;
            assert_eq!(transport.last_request().url, url, "model {model}");
        }
    }

    #[tokio::test]
    async fn ollama_uses_resolved_base_url() {
        let transport = Arc::new(ScriptedTransport::chunks([]));
        let mut target = target(ProviderKind::Ollama, "llama3.1:8b");
        target.base_url = Some("http://gpu-box:11434/".into());
        let backend = build_backend(&target, transport.clone()).unwrap();
        assert_eq!(backend.name(), "ollama");
        let _ = backend
            .stream(
                &CallContext::background(),
                &request("llama3.1:8b"),
                &mut |_: &str| {},
            )
            .await;
        assert_eq!(
            transport.last_request().url,
            "http://gpu-box:11434/api/generate"
        );
    }

    #[tokio::test]
    async fn boxed_backends_forward_deltas_to_a_named_sink() {
        let cases = [
            (
                ProviderKind::OpenAI,
                "gpt-4o-mini",
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                 data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                 data: [DONE]\n",
            ),
            (
                ProviderKind::Ollama,
                "llama3",
                "{\"response\":\"Hel\",\"done\":false}\n\
                 {\"response\":\"lo\",\"done\":true}\n",
            ),
        ];
        for (provider, model, wire) in cases {
            let transport = Arc::new(ScriptedTransport::chunks([wire]));
            let backend: Box<dyn Backend> =
                build_backend(&target(provider, model), transport).unwrap();

            let mut seen = Vec::new();
            let mut collect = |delta: &str| seen.push(delta.to_string());
            let sink: &mut (dyn for<'d> FnMut(&'d str) + Send) = &mut collect;
            let completion = backend
                .stream(&CallContext::background(), &request(model), sink)
                .await
                .unwrap();

            assert_eq!(completion.text, "Hello", "{provider}");
            assert_eq!(seen, ["Hel", "lo"], "{provider}");
        }
    }

    #[test]
    fn placeholder_providers_are_not_implemented() {
        let transport = Arc::new(ScriptedTransport::chunks([]));
        let err = match build_backend(&target(ProviderKind::Mistral, "mixtral-8x7b"), transport) {
            Err(err) => err,
            Ok(backend) => panic!("unexpected backend {}", backend.name()),
        };
        assert_eq!(err, ResolveError::NotImplemented("mistral".into()));
    }

    #[test]
    fn zero_usage_fields_are_not_serialized() {
        let usage = Usage {
            prompt_tokens: 3,
            completion_tokens: 0,
            total_tokens: 3,
        };
        assert_eq!(
            serde_json::to_string(&usage).unwrap(),
            r#"{"prompt_tokens":3,"total_tokens":3}"#
        );
        assert_eq!(serde_json::to_string(&Usage::default()).unwrap(), "{}");
    }

    #[test]
    fn endpoint_trims_trailing_slashes() {
        assert_eq!(
            endpoint("http://h/v1//", "/responses"),
            "http://h/v1/responses"
        );
        assert_eq!(
            endpoint("http://h", "/api/generate"),
            "http://h/api/generate"
        );
    }
}
