//! OpenAI Responses API backend (`POST {base}/responses`).
//!
//! Used for reasoning-capable model families. Some of them reject sampling
//! parameters, so `temperature` and `top_p` are only sent when the model
//! accepts them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::prompt::prose_join;
use super::stream::{drive, sse::SseDecoder};
use super::transport::{open, read_to_end, HttpRequest, Transport};
use super::{endpoint, log_request, Backend, CallContext, Completion, CompletionRequest, Usage};
use crate::constants::{NO_SAMPLING_MODEL_PREFIX, OPENAI_DEFAULT_BASE_URL};
use crate::error::CompletionError;

const LABEL: &str = "openai responses";

/// Content part types that carry output text. Older payloads omit the type.
const TEXT_KINDS: &[&str] = &["text", "output_text", ""];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsesResponse {
    output: Vec<OutputItem>,
    usage: Option<ResponsesUsage>,
}

/// One item of a response's `output` array.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OutputItem {
    content: Option<Vec<ContentPart>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl OutputItem {
    /// Non-empty text fragments, in order.
    pub(crate) fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.content
            .iter()
            .flatten()
            .filter(|part| TEXT_KINDS.contains(&part.kind.as_str()))
            .filter_map(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
    }
}

/// Token counts as the Responses API names them.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
pub(crate) struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}

impl From<ResponsesUsage> for Usage {
    fn from(u: ResponsesUsage) -> Self {
        Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

/// Whether the model accepts `temperature` / `top_p`.
fn supports_sampling(model: &str) -> bool {
    !model
        .trim()
        .to_lowercase()
        .starts_with(NO_SAMPLING_MODEL_PREFIX)
}

/// Backend for the Responses API.
pub struct OpenAiResponses {
    api_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl OpenAiResponses {
    pub fn new(api_key: &str, base_url: Option<&str>, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or(OPENAI_DEFAULT_BASE_URL).to_string(),
            transport,
        }
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> HttpRequest {
        let mut body = json!({
            "model": request.model,
            "input": prose_join(&request.prompt, &request.data),
            "stream": stream,
        });
        if request.max_tokens > 0 {
            body["max_output_tokens"] = json!(request.max_tokens);
        }
        if supports_sampling(&request.model) {
            body["temperature"] = json!(request.temperature);
            body["top_p"] = json!(request.top_p);
        } else {
            debug!(model = %request.model, "omitting sampling parameters");
        }

        HttpRequest {
            url: endpoint(&self.base_url, "/responses"),
            bearer: (!self.api_key.is_empty()).then(|| self.api_key.clone()),
            body,
        }
    }
}

#[async_trait]
impl Backend for OpenAiResponses {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(
        &self,
        ctx: &CallContext,
        request: &CompletionRequest,
    ) -> Result<Completion, CompletionError> {
        let http = self.build_request(request, false);
        log_request(LABEL, &http.url, &http.body);

        let body = open(self.transport.as_ref(), ctx, LABEL, http).await?;
        let bytes = read_to_end(ctx, LABEL, body).await?;
        let response: ResponsesResponse = serde_json::from_slice(&bytes)?;

        let text: String = response.output.iter().flat_map(OutputItem::texts).collect();
        Ok(Completion {
            text,
            usage: response.usage.map(Usage::from).unwrap_or_default(),
        })
    }

    async fn stream(
        &self,
        ctx: &CallContext,
        request: &CompletionRequest,
        on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<Completion, CompletionError> {
        let http = self.build_request(request, true);
        log_request(LABEL, &http.url, &http.body);

        let body = open(self.transport.as_ref(), ctx, LABEL, http).await?;
        drive(ctx, body, SseDecoder::responses(), on_delta).await
    }
}
