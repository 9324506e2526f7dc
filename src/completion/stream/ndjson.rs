//! Newline-delimited JSON decoding for Ollama's generate stream.
//!
//! Each line is one complete object. There is no sentinel line: the stream
//! ends at an object with `done: true`, or at end of input.

use tracing::{debug, trace};

use super::{Accumulator, LineDecoder, LineOutcome};
use crate::completion::ollama::GenerateResponse;

#[derive(Debug, Default)]
pub struct NdjsonDecoder;

impl LineDecoder for NdjsonDecoder {
    fn decode_line(&mut self, line: &str, out: &mut Accumulator<'_>) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Continue;
        }

        let chunk: GenerateResponse = match serde_json::from_str(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                trace!(error = %e, line, "skipping undecodable ndjson line");
                return LineOutcome::Continue;
            }
        };

        out.push(&chunk.response);

        if !chunk.done {
            return LineOutcome::Continue;
        }
        debug!(
            total_ns = chunk.total_duration,
            load_ns = chunk.load_duration,
            prompt_eval_ns = chunk.prompt_eval_duration,
            eval_ns = chunk.eval_duration,
            "ollama stream finished"
        );
        out.set_usage(chunk.usage());
        LineOutcome::Done
    }
}
