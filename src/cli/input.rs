//! Prompt and data resolution from flags and piped stdin.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::constants::MAX_DATA_BYTES;
use crate::error::UsageError;

/// The user-facing text of one call, before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    pub prompt: String,
    pub data: String,
}

/// Raw input flags as parsed by clap.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFlags<'a> {
    /// `None` without `-p`, `Some(None)` for a bare `-p`.
    pub prompt: Option<Option<&'a str>>,
    pub data: Option<&'a str>,
    pub data_file: Option<&'a Path>,
}

/// Reads all of stdin when it is piped. `None` on a terminal.
pub fn read_stdin() -> Result<Option<String>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = Vec::new();
    stdin.read_to_end(&mut buf).context("failed reading stdin")?;
    Ok(Some(lossy(buf)))
}

/// Resolves prompt and data.
///
/// `stdin` is only called when its content may be used, so a piped but
/// unused stdin is never drained.
pub fn resolve(
    flags: InputFlags<'_>,
    stdin: impl FnOnce() -> Result<Option<String>>,
) -> Result<Input> {
    if flags.data == Some("") {
        return Err(usage(
            "--data requires a value; use --data-file or pipe stdin per rules",
        ));
    }
    if flags.data.is_some() && flags.data_file.is_some() {
        return Err(usage("cannot use both --data and --data-file"));
    }

    let prompt_from_stdin = matches!(flags.prompt, Some(None));
    let needs_stdin = prompt_from_stdin || (flags.data.is_none() && flags.data_file.is_none());
    let mut piped = if needs_stdin { stdin()? } else { None };

    let prompt = match flags.prompt {
        Some(Some(text)) => text.to_string(),
        Some(None) => match piped.take().filter(|s| !s.is_empty()) {
            Some(text) => text,
            None => return Err(usage("'-p' used with no prompt on stdin")),
        },
        None => String::new(),
    };

    let data = if let Some(inline) = flags.data {
        inline.to_string()
    } else if let Some(path) = flags.data_file {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read --data-file: {}", path.display()))?;
        lossy(bytes)
    } else {
        piped.unwrap_or_default()
    };

    if data.len() > MAX_DATA_BYTES {
        return Err(usage(&format!(
            "data is {} bytes; the limit is {MAX_DATA_BYTES}",
            data.len()
        )));
    }

    Ok(Input { prompt, data })
}

/// Decodes input bytes, replacing invalid UTF-8 instead of rejecting it.
fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

fn usage(message: &str) -> anyhow::Error {
    UsageError(message.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_stdin() -> Result<Option<String>> {
        Ok(None)
    }

    fn usage_message(err: anyhow::Error) -> String {
        err.downcast::<UsageError>()
            .expect("expected a usage error")
            .0
    }

    #[test]
    fn inline_prompt_and_data() {
        let flags = InputFlags {
            prompt: Some(Some("count words")),
            data: Some("one two"),
            ..InputFlags::default()
        };
        let input = resolve(flags, || panic!("stdin must not be read")).unwrap();
        assert_eq!(input.prompt, "count words");
        assert_eq!(input.data, "one two");
    }

    #[test]
    fn piped_stdin_becomes_data() {
        let flags = InputFlags {
            prompt: Some(Some("summarize")),
            ..InputFlags::default()
        };
        let input = resolve(flags, || Ok(Some("log line\n".into()))).unwrap();
        assert_eq!(input.data, "log line\n");
    }

    #[test]
    fn bare_prompt_flag_consumes_stdin() {
        let flags = InputFlags {
            prompt: Some(None),
            ..InputFlags::default()
        };
        let input = resolve(flags, || Ok(Some("what is rust".into()))).unwrap();
        assert_eq!(input.prompt, "what is rust");
        assert_eq!(input.data, "");
    }

    #[test]
    fn bare_prompt_flag_with_inline_data() {
        let flags = InputFlags {
            prompt: Some(None),
            data: Some("payload"),
            ..InputFlags::default()
        };
        let input = resolve(flags, || Ok(Some("question".into()))).unwrap();
        assert_eq!(input.prompt, "question");
        assert_eq!(input.data, "payload");
    }

    #[test]
    fn bare_prompt_flag_without_stdin_is_usage_error() {
        let flags = InputFlags {
            prompt: Some(None),
            ..InputFlags::default()
        };
        let err = resolve(flags, no_stdin).unwrap_err();
        assert_eq!(usage_message(err), "'-p' used with no prompt on stdin");

        let err = resolve(flags, || Ok(Some(String::new()))).unwrap_err();
        assert_eq!(usage_message(err), "'-p' used with no prompt on stdin");
    }

    #[test]
    fn empty_inline_data_is_usage_error() {
        let flags = InputFlags {
            data: Some(""),
            ..InputFlags::default()
        };
        let err = resolve(flags, no_stdin).unwrap_err();
        assert!(usage_message(err).starts_with("--data requires a value"));
    }

    #[test]
    fn data_and_data_file_conflict() {
        let flags = InputFlags {
            data: Some("x"),
            data_file: Some(Path::new("/tmp/whatever")),
            ..InputFlags::default()
        };
        let err = resolve(flags, no_stdin).unwrap_err();
        assert_eq!(usage_message(err), "cannot use both --data and --data-file");
    }

    #[test]
    fn data_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, "from file").unwrap();
        let flags = InputFlags {
            data_file: Some(&path),
            ..InputFlags::default()
        };
        let input = resolve(flags, || panic!("stdin must not be read")).unwrap();
        assert_eq!(input.data, "from file");
    }

    #[test]
    fn non_utf8_data_file_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9 ok").unwrap();
        let flags = InputFlags {
            data_file: Some(&path),
            ..InputFlags::default()
        };
        let input = resolve(flags, no_stdin).unwrap();
        assert_eq!(input.data, "caf\u{fffd} ok");
    }

    #[test]
    fn lossy_keeps_valid_text_untouched() {
        assert_eq!(lossy(b"plain text".to_vec()), "plain text");
        assert_eq!(lossy(vec![0xff, b'a']), "\u{fffd}a");
    }

    #[test]
    fn missing_data_file_is_not_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let flags = InputFlags {
            data_file: Some(&path),
            ..InputFlags::default()
        };
        let err = resolve(flags, no_stdin).unwrap_err();
        assert!(err.downcast_ref::<UsageError>().is_none());
        assert!(err.to_string().starts_with("failed to read --data-file"));
    }

    #[test]
    fn oversized_data_is_usage_error() {
        let big = "x".repeat(MAX_DATA_BYTES + 1);
        let flags = InputFlags {
            data: Some(&big),
            ..InputFlags::default()
        };
        let err = resolve(flags, no_stdin).unwrap_err();
        assert!(usage_message(err).contains("limit"));
    }

    #[test]
    fn nothing_given_yields_empty_input() {
        let input = resolve(InputFlags::default(), no_stdin).unwrap();
        assert_eq!(input, Input::default());
    }
}
