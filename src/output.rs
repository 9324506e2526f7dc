//! Output rendering for nuro.
//!
//! Defines the [`Renderer`] trait that decouples completion output from the
//! terminal. [`StdoutRenderer`] prints plain text or a pretty JSON result.

use std::io::{self, Stdout, Write};

use serde::Serialize;

use crate::completion::Usage;

/// Structured result printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonResult {
    pub provider: String,
    pub model: String,
    pub usage: Usage,
    pub text: String,
}

/// Trait for rendering completion output.
pub trait Renderer {
    /// Render a streamed delta as it arrives.
    fn render_delta(&mut self, delta: &str);

    /// Render the finished call.
    fn render_done(&mut self, result: &JsonResult) -> io::Result<()>;

    /// Called when a stream fails after printing some text.
    fn render_interrupted(&mut self);
}

/// Renders to stdout (or any writer, in tests).
///
/// Deltas are flushed immediately so text appears as it arrives.
pub struct StdoutRenderer<W: Write = Stdout> {
    out: W,
    json: bool,
    streamed: bool,
}

impl StdoutRenderer {
    pub fn new(json: bool) -> Self {
        Self::with_writer(io::stdout(), json)
    }
}

impl<W: Write> StdoutRenderer<W> {
    pub fn with_writer(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            streamed: false,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for StdoutRenderer<W> {
    fn render_delta(&mut self, delta: &str) {
        self.streamed = true;
        // A closed stdout is not worth aborting the stream over
        let _ = self.out.write_all(delta.as_bytes());
        self.out.flush().ok();
    }

    fn render_done(&mut self, result: &JsonResult) -> io::Result<()> {
        if self.streamed {
            writeln!(self.out)?;
        }
        if self.json {
            serde_json::to_writer_pretty(&mut self.out, result)?;
            writeln!(self.out)?;
        } else if !self.streamed {
            writeln!(self.out, "{}", result.text)?;
        }
        self.out.flush()
    }

    fn render_interrupted(&mut self) {
        if self.streamed {
            let _ = writeln!(self.out);
            self.out.flush().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, usage: Usage) -> JsonResult {
        JsonResult {
            provider: "ollama".into(),
            model: "llama3".into(),
            usage,
            text: text.into(),
        }
    }

    fn rendered(renderer: StdoutRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn plain_text_ends_with_newline() {
        let mut r = StdoutRenderer::with_writer(Vec::new(), false);
        r.render_done(&result("five", Usage::default())).unwrap();
        assert_eq!(rendered(r), "five\n");
    }

    #[test]
    fn streamed_text_is_not_repeated() {
        let mut r = StdoutRenderer::with_writer(Vec::new(), false);
        r.render_delta("Hello");
        r.render_delta(" world");
        r.render_done(&result("Hello world", Usage::default())).unwrap();
        assert_eq!(rendered(r), "Hello world\n");
    }

    #[test]
    fn json_omits_zero_usage_counters() {
        let mut r = StdoutRenderer::with_writer(Vec::new(), true);
        let usage = Usage {
            prompt_tokens: 3,
            completion_tokens: 2,
            total_tokens: 5,
        };
        r.render_done(&result("hi", usage)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered(r)).unwrap();
        assert_eq!(value["provider"], "ollama");
        assert_eq!(value["usage"]["total_tokens"], 5);
        assert_eq!(value["text"], "hi");

        let mut r = StdoutRenderer::with_writer(Vec::new(), true);
        r.render_done(&result("hi", Usage::default())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered(r)).unwrap();
        assert_eq!(value["usage"], serde_json::json!({}));
    }

    #[test]
    fn streamed_json_starts_after_a_newline() {
        let mut r = StdoutRenderer::with_writer(Vec::new(), true);
        r.render_delta("hi");
        r.render_done(&result("hi", Usage::default())).unwrap();
        let out = rendered(r);
        assert!(out.starts_with("hi\n{"));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn interruption_closes_the_line_only_after_output() {
        let mut r = StdoutRenderer::with_writer(Vec::new(), false);
        r.render_interrupted();
        assert_eq!(rendered(r), "");

        let mut r = StdoutRenderer::with_writer(Vec::new(), false);
        r.render_delta("Hel");
        r.render_interrupted();
        assert_eq!(rendered(r), "Hel\n");
    }
}
