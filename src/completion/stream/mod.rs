//! Line-framed stream decoding.
//!
//! [`drive`] reads a [`ByteStream`], splits it into lines with a
//! [`LineBuffer`] and hands each line to a [`LineDecoder`]. The decoders
//! for SSE and NDJSON framing live in [`sse`] and [`ndjson`].
//!
//! Every loop iteration checks the [`CallContext`] first, and every read is
//! raced against it, so a cancelled call stops promptly and reports
//! cancellation even when the transport fails in the same iteration.

pub mod ndjson;
pub mod sse;

use futures::StreamExt;

use super::context::CallContext;
use super::transport::ByteStream;
use super::{Completion, Usage};
use crate::error::CompletionError;

/// Whether a decoded line ended the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Done,
}

/// Turns one line of a response body into deltas and usage.
///
/// Decoders never fail: lines they cannot use are skipped.
pub trait LineDecoder: Send {
    fn decode_line(&mut self, line: &str, out: &mut Accumulator<'_>) -> LineOutcome;
}

/// Collects streamed text and forwards each delta to the caller's sink.
pub struct Accumulator<'a> {
    text: String,
    usage: Usage,
    on_delta: &'a mut (dyn for<'d> FnMut(&'d str) + Send),
}

impl<'a> Accumulator<'a> {
    pub fn new(on_delta: &'a mut (dyn for<'d> FnMut(&'d str) + Send)) -> Self {
        Self {
            text: String::new(),
            usage: Usage::default(),
            on_delta,
        }
    }

    /// Emits a delta. Empty deltas are dropped.
    pub fn push(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        (self.on_delta)(delta);
        self.text.push_str(delta);
    }

    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    fn snapshot(&self) -> Completion {
        Completion {
            text: self.text.clone(),
            usage: self.usage,
        }
    }

    fn finish(self) -> Completion {
        Completion {
            text: self.text,
            usage: self.usage,
        }
    }
}

/// Byte buffer that yields complete `\n`-terminated lines.
///
/// Lines are split on raw bytes, so a multi-byte character split across
/// two reads is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Removes and returns the next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Returns whatever is left after the last newline, if anything.
    pub fn take_rest(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// Decodes `body` line by line until a terminal marker or end of input.
///
/// Every failure after the request was sent comes back as
/// [`CompletionError::Interrupted`] carrying the text and usage received
/// so far.
pub async fn drive<D: LineDecoder>(
    ctx: &CallContext,
    mut body: ByteStream,
    mut decoder: D,
    on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
) -> Result<Completion, CompletionError> {
    let mut out = Accumulator::new(on_delta);
    let mut lines = LineBuffer::default();

    loop {
        if let Err(err) = ctx.check() {
            return Err(CompletionError::interrupted(out.snapshot(), err));
        }

        while let Some(line) = lines.next_line() {
            if let Err(err) = ctx.check() {
                return Err(CompletionError::interrupted(out.snapshot(), err));
            }
            if decoder.decode_line(&line, &mut out) == LineOutcome::Done {
                return Ok(out.finish());
            }
        }

        let next = tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            next = body.next() => Ok(next),
        };

        match next {
            Err(err) => return Err(CompletionError::interrupted(out.snapshot(), err)),
            Ok(Some(Ok(chunk))) => lines.extend(&chunk),
            Ok(Some(Err(err))) => {
                let cause = match ctx.check() {
                    Err(cancelled) => cancelled,
                    Ok(()) => CompletionError::Transport(err.to_string()),
                };
                return Err(CompletionError::interrupted(out.snapshot(), cause));
            }
            Ok(None) => {
                // No terminal marker: a clean end of input still succeeds.
                if let Some(rest) = lines.take_rest() {
                    decoder.decode_line(&rest, &mut out);
                }
                return Ok(out.finish());
            }
        }
    }
}
