//! OpenAI chat completions backend (`POST {base}/chat/completions`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::prompt::prose_join;
use super::stream::{drive, sse::SseDecoder};
use super::transport::{open, read_to_end, HttpRequest, Transport};
use super::{endpoint, log_request, Backend, CallContext, Completion, CompletionRequest, Usage};
use crate::constants::OPENAI_DEFAULT_BASE_URL;
use crate::error::CompletionError;

const LABEL: &str = "openai";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// One entry of `choices` in a streamed chunk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChunkDelta {
    content: Option<String>,
}

impl ChunkChoice {
    pub(crate) fn content(&self) -> Option<&str> {
        self.delta.as_ref()?.content.as_deref()
    }
}

/// Backend for the chat completions endpoint.
pub struct OpenAiChat {
    api_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl OpenAiChat {
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
            "messages": [{
                "role": "user",
                "content": prose_join(&request.prompt, &request.data),
            }],
            "temperature": request.temperature,
            "top_p": request.top_p,
            "stream": stream,
        });
        if request.max_tokens > 0 {
            body["max_tokens"] = json!(request.max_tokens);
        }

        HttpRequest {
            url: endpoint(&self.base_url, "/chat/completions"),
            bearer: (!self.api_key.is_empty()).then(|| self.api_key.clone()),
            body,
        }
    }
}

#[async_trait]
impl Backend for OpenAiChat {
    fn name(&self) -> &'static str {
        LABEL
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
        let response: ChatResponse = serde_json::from_slice(&bytes)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::NoChoices(LABEL))?;
        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            usage: response.usage.unwrap_or_default(),
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
        drive(ctx, body, SseDecoder::chat(), on_delta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::tests::request;
    use crate::completion::transport::testing::ScriptedTransport;
    use crate::error::TransportError;

    fn backend(transport: &Arc<ScriptedTransport>) -> OpenAiChat {
        OpenAiChat::new("sk-test", None, transport.clone())
    }

    #[tokio::test]
    async fn complete_reads_first_choice_and_usage() {
        let transport = Arc::new(ScriptedTransport::chunks([
            r#"{"choices":[{"message":{"role":"assistant","content":"five"}},"#,
            r#"{"message":{"content":"ignored"}}],"usage":{"prompt_tokens":9,"completion_tokens":1,"total_tokens":10}}"#,
        ]));
        let result = backend(&transport)
            .complete(&CallContext::background(), &request("gpt-4o-mini"))
            .await
            .unwrap();

        assert_eq!(result.text, "five");
        assert_eq!(result.usage.total_tokens, 10);

        let sent = transport.last_request();
        assert_eq!(sent.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(sent.bearer.as_deref(), Some("sk-test"));
        assert_eq!(sent.body["messages"][0]["role"], "user");
        assert_eq!(
            sent.body["messages"][0]["content"],
            "count words in the following data: one two"
        );
        assert_eq!(sent.body["stream"], false);
        assert_eq!(sent.body["temperature"], 0.7);
        assert_eq!(sent.body["top_p"], 1.0);
        assert!(sent.body.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn missing_usage_is_zero() {
        let transport = Arc::new(ScriptedTransport::chunks([
            r#"{"choices":[{"message":{"content":"ok"}}]}"#,
        ]));
        let result = backend(&transport)
            .complete(&CallContext::background(), &request("gpt-4o"))
            .await
            .unwrap();
        assert_eq!(result.usage, Usage::default());
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let transport = Arc::new(ScriptedTransport::chunks([r#"{"choices":[]}"#]));
        let err = backend(&transport)
            .complete(&CallContext::background(), &request("gpt-4o"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "openai: no choices returned");
    }

    #[tokio::test]
    async fn malformed_response_is_a_decode_error() {
        let transport = Arc::new(ScriptedTransport::chunks(["<html>"]));
        let err = backend(&transport)
            .complete(&CallContext::background(), &request("gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Decode(_)));
    }

    #[tokio::test]
    async fn status_error_names_backend() {
        let transport = Arc::new(ScriptedTransport::failing(TransportError::Status {
            status: "429 Too Many Requests".into(),
            body: "slow down".into(),
        }));
        let err = backend(&transport)
            .complete(&CallContext::background(), &request("gpt-4o"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "openai error: 429 Too Many Requests - slow down"
        );
    }

    #[tokio::test]
    async fn stream_matches_non_streaming_text_and_reports_no_usage() {
        let transport = Arc::new(ScriptedTransport::chunks([
            "data: {\"choices\":[{\"delta\":{\"content\":\"fi\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ve\"}}]}\n\ndata: [DONE]\n\n",
        ]));
        let mut req = request("gpt-4o-mini");
        req.max_tokens = 64;
        let mut deltas = Vec::new();
        let result = backend(&transport)
            .stream(&CallContext::background(), &req, &mut |d: &str| {
                deltas.push(d.to_string())
            })
            .await
            .unwrap();

        assert_eq!(deltas, ["fi", "ve"]);
        assert_eq!(result.text, "five");
        assert_eq!(result.usage, Usage::default());

        let sent = transport.last_request();
        assert_eq!(sent.body["stream"], true);
        assert_eq!(sent.body["max_tokens"], 64);
    }

    #[test]
    fn custom_base_url_and_empty_key() {
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::chunks([]));
        let backend = OpenAiChat::new("", Some("http://localhost:8080/v1/"), transport);
        let http = backend.build_request(&request("local-model"), false);
        assert_eq!(http.url, "http://localhost:8080/v1/chat/completions");
        assert!(http.bearer.is_none());
    }
}
