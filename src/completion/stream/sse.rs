//! Server-Sent Events decoding for the OpenAI backends.
//!
//! The stream looks like:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hello"}}]}
//!
//! data: {"type":"response.output_text.delta","delta":" world"}
//!
//! data: [DONE]
//! ```
//!
//! Each payload is decoded once into a shape that covers both Responses API
//! events and chat-completion chunks. Responses content wins; chat deltas
//! are only read when the payload carried no Responses content.

use serde::Deserialize;
use tracing::trace;

use super::{Accumulator, LineDecoder, LineOutcome};
use crate::completion::openai_chat::ChunkChoice;
use crate::completion::openai_responses::{OutputItem, ResponsesUsage};

/// Payload that terminates an SSE stream.
const DONE_SENTINEL: &str = "[DONE]";

const TEXT_DELTA_EVENT: &str = "response.output_text.delta";
const COMPLETED_EVENT: &str = "response.completed";
const RESPONSES_EVENT_PREFIX: &str = "response.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<String>,
    response: Option<ResponseSummary>,
    output: Vec<OutputItem>,
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseSummary {
    usage: Option<ResponsesUsage>,
}

/// Decoder for `data:` framed streams.
#[derive(Debug)]
pub struct SseDecoder {
    report_usage: bool,
}

impl SseDecoder {
    /// Chat completions never report usage while streaming.
    pub fn chat() -> Self {
        Self {
            report_usage: false,
        }
    }

    /// Responses API streams report usage in `response.completed`.
    pub fn responses() -> Self {
        Self { report_usage: true }
    }

    fn apply(&self, payload: Payload, out: &mut Accumulator<'_>) {
        match payload.kind.as_str() {
            TEXT_DELTA_EVENT => {
                out.push(payload.delta.as_deref().unwrap_or_default());
                return;
            }
            COMPLETED_EVENT => {
                if let Some(usage) = payload.response.and_then(|r| r.usage) {
                    if self.report_usage {
                        out.set_usage(usage.into());
                    }
                }
                return;
            }
            _ => {}
        }

        let mut found = false;
        for text in payload.output.iter().flat_map(OutputItem::texts) {
            out.push(text);
            found = true;
        }
        if found || payload.kind.starts_with(RESPONSES_EVENT_PREFIX) {
            return;
        }

        for choice in &payload.choices {
            if let Some(content) = choice.content() {
                out.push(content);
            }
        }
    }
}

impl LineDecoder for SseDecoder {
    fn decode_line(&mut self, line: &str, out: &mut Accumulator<'_>) -> LineOutcome {
        let line = line.trim();
        // event:, id:, retry: and comment lines carry nothing we use
        let Some(payload) = line.strip_prefix("data:") else {
            return LineOutcome::Continue;
        };
        let payload = payload.trim_start();
        if payload.is_empty() {
            return LineOutcome::Continue;
        }
        if payload == DONE_SENTINEL {
            return LineOutcome::Done;
        }

        match serde_json::from_str::<Payload>(payload) {
            Ok(payload) => self.apply(payload, out),
            Err(e) => trace!(error = %e, payload, "skipping undecodable sse payload"),
        }
        LineOutcome::Continue
    }
}
