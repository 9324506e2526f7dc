//! Ollama native backend (`POST {base}/api/generate`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompt::labeled_join;
use super::stream::{drive, ndjson::NdjsonDecoder};
use super::transport::{open, read_to_end, HttpRequest, Transport};
use super::{endpoint, log_request, Backend, CallContext, Completion, CompletionRequest, Usage};
use crate::constants::OLLAMA_DEFAULT_BASE_URL;
use crate::error::CompletionError;

const LABEL: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "GenerateOptions::is_empty")]
    options: GenerateOptions,
}

/// Sampling options; zero values are left to the server's defaults.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn from_request(request: &CompletionRequest) -> Self {
        Self {
            temperature: (request.temperature != 0.0).then_some(request.temperature),
            top_p: (request.top_p != 0.0).then_some(request.top_p),
            num_predict: (request.max_tokens != 0).then_some(request.max_tokens),
        }
    }

    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

/// One generate response object; the whole body when not streaming, one
/// line of the body when streaming. Durations are in nanoseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GenerateResponse {
    pub model: String,
    pub response: String,
    pub done: bool,
    pub context: Vec<i64>,
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_count: u32,
    pub prompt_eval_duration: u64,
    pub eval_count: u32,
    pub eval_duration: u64,
}

impl GenerateResponse {
    pub fn usage(&self) -> Usage {
        Usage {
            prompt_tokens: self.prompt_eval_count,
            completion_tokens: self.eval_count,
            total_tokens: self.prompt_eval_count + self.eval_count,
        }
    }
}

/// Backend for a local or remote Ollama server. Sends no credential.
pub struct Ollama {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl Ollama {
    pub fn new(base_url: Option<&str>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.unwrap_or(OLLAMA_DEFAULT_BASE_URL).to_string(),
            transport,
        }
    }

    fn build_request(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<HttpRequest, CompletionError> {
        let body = GenerateRequest {
            model: &request.model,
            prompt: labeled_join(&request.prompt, &request.data),
            stream,
            system: None,
            template: None,
            context: None,
            options: GenerateOptions::from_request(request),
        };

        Ok(HttpRequest {
            url: endpoint(&self.base_url, "/api/generate"),
            bearer: None,
            body: serde_json::to_value(&body).map_err(|e| CompletionError::Encode(e.to_string()))?,
        })
    }
}

#[async_trait]
impl Backend for Ollama {
    fn name(&self) -> &'static str {
        LABEL
    }

    async fn complete(
        &self,
        ctx: &CallContext,
        request: &CompletionRequest,
    ) -> Result<Completion, CompletionError> {
        let http = self.build_request(request, false)?;
        log_request(LABEL, &http.url, &http.body);

        let body = open(self.transport.as_ref(), ctx, LABEL, http).await?;
        let bytes = read_to_end(ctx, LABEL, body).await?;
        let response: GenerateResponse = serde_json::from_slice(&bytes)?;

        debug!(
            model = %response.model,
            context_tokens = response.context.len(),
            total_ns = response.total_duration,
            load_ns = response.load_duration,
            prompt_eval_ns = response.prompt_eval_duration,
            eval_ns = response.eval_duration,
            "ollama generate finished"
        );
        Ok(Completion {
            usage: response.usage(),
            text: response.response,
        })
    }

    async fn stream(
        &self,
        ctx: &CallContext,
        request: &CompletionRequest,
        on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<Completion, CompletionError> {
        let http = self.build_request(request, true)?;
        log_request(LABEL, &http.url, &http.body);

        let body = open(self.transport.as_ref(), ctx, LABEL, http).await?;
        drive(ctx, body, NdjsonDecoder, on_delta).await
    }
}
