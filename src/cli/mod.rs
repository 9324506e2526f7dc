//! Command-line interface definition and dispatch for nuro.
//!
//! Uses [`clap`] derive macros for argument parsing. A single invocation
//! resolves input, applies a profile, resolves the provider and runs one
//! completion call; prompt and data handling live in the [`input`] submodule.

mod input;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::completion::{
    self, Backend, CallContext, Completion, CompletionRequest, HttpTransport,
};
use crate::config::{apply_profile, ProfileFile};
use crate::constants::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_P, ENV_MAX_TOKENS,
    ENV_TEMPERATURE, ENV_TOP_P,
};
use crate::env::Environment;
use crate::error::{ConfigError, UsageError};
use crate::output::{JsonResult, Renderer, StdoutRenderer};
use crate::{logging, provider};

use input::InputFlags;

/// Top-level CLI structure for nuro.
///
/// The `///` doc comments on fields double as `--help` text.
#[derive(Parser, Debug)]
#[command(
    name = "nuro",
    version,
    about = "One-shot LLM completions from the terminal"
)]
pub struct Cli {
    /// Prompt text. Use '-p' with no value to read the prompt from stdin
    #[arg(short, long, num_args = 0..=1, value_name = "TEXT")]
    pub prompt: Option<Option<String>>,

    /// Inline data/payload string
    #[arg(long, value_name = "TEXT", conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Path to a file containing data/payload
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Model name, or '$VAR' to read it from an environment variable
    #[arg(short, long)]
    pub model: Option<String>,

    /// Max output tokens [default: NURO_MAX_TOKENS or 1024]
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature, 0 to 2 [default: NURO_TEMPERATURE or 0.7]
    #[arg(long, value_name = "F")]
    pub temperature: Option<f64>,

    /// Nucleus sampling top-p, 0 to 1 [default: NURO_TOP_P or 1.0]
    #[arg(long, value_name = "F")]
    pub top_p: Option<f64>,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Stream text as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Print a JSON object with provider, model, usage and text
    #[arg(long)]
    pub json: bool,

    /// Log provider selection and request details to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Profile to apply from the config file
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Config file to read instead of ./.nuro.toml or the global one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Parses command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Sampling parameters after applying flag, profile and built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sampling {
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

impl Sampling {
    fn resolve(cli: &Cli, env: &Environment) -> Result<Self, UsageError> {
        let sampling = Self {
            max_tokens: layered(cli.max_tokens, env, ENV_MAX_TOKENS, DEFAULT_MAX_TOKENS)?,
            temperature: layered(cli.temperature, env, ENV_TEMPERATURE, DEFAULT_TEMPERATURE)?,
            top_p: layered(cli.top_p, env, ENV_TOP_P, DEFAULT_TOP_P)?,
        };
        if !(0.0..=2.0).contains(&sampling.temperature) {
            return Err(UsageError(format!(
                "--temperature must be between 0 and 2, got {}",
                sampling.temperature
            )));
        }
        if !(0.0..=1.0).contains(&sampling.top_p) {
            return Err(UsageError(format!(
                "--top-p must be between 0 and 1, got {}",
                sampling.top_p
            )));
        }
        Ok(sampling)
    }
}

/// Flag value, else the environment default, else the built-in one.
fn layered<T: FromStr>(
    flag: Option<T>,
    env: &Environment,
    var: &str,
    fallback: T,
) -> Result<T, UsageError> {
    if let Some(value) = flag {
        return Ok(value);
    }
    match env.get(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| UsageError(format!("invalid {var} value '{raw}'"))),
        None => Ok(fallback),
    }
}

/// Applies the profile file, if any, to `env`.
fn apply_config(cli: &Cli, env: &mut Environment) -> Result<()> {
    match ProfileFile::discover(cli.config.as_deref())? {
        Some((path, file)) => {
            if let Some(name) = apply_profile(&file, cli.profile.as_deref(), env)? {
                debug!(profile = %name, path = %path.display(), "profile applied");
            }
        }
        None if cli.profile.is_some() => return Err(ConfigError::NoProfiles.into()),
        None => {}
    }
    Ok(())
}

/// Spawns a task that cancels `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            token.cancel();
        }
    });
}

/// Runs one completion from parsed arguments.
pub async fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose);

    let mut env = Environment::from_process();
    apply_config(&cli, &mut env)?;

    let flags = InputFlags {
        prompt: cli.prompt.as_ref().map(|p| p.as_deref()),
        data: cli.data.as_deref(),
        data_file: cli.data_file.as_deref(),
    };
    let input = input::resolve(flags, input::read_stdin)?;
    let sampling = Sampling::resolve(&cli, &env)?;

    let target = provider::resolve(cli.model.as_deref().unwrap_or_default(), &env)?;
    if cli.verbose || (cli.model.is_some() && !cli.json) {
        eprintln!(
            "{} provider={} model={}",
            "nuro:".dimmed(),
            target.provider,
            target.model
        );
    }

    let transport = HttpTransport::new().context("failed to create HTTP client")?;
    let backend = completion::build_backend(&target, Arc::new(transport))?;

    let request = CompletionRequest {
        model: target.model.clone(),
        prompt: input.prompt,
        data: input.data,
        max_tokens: sampling.max_tokens,
        temperature: sampling.temperature,
        top_p: sampling.top_p,
        stream: cli.stream,
        timeout: Duration::from_secs(cli.timeout),
    };

    let ctx = CallContext::new(request.timeout, CancellationToken::new());
    cancel_on_interrupt(ctx.token().clone());

    let mut renderer = StdoutRenderer::new(cli.json);
    let outcome = if request.stream {
        let mut sink = |delta: &str| renderer.render_delta(delta);
        backend.stream(&ctx, &request, &mut sink).await
    } else {
        backend.complete(&ctx, &request).await
    };

    let completion = match outcome {
        Ok(completion) => completion,
        Err(err) => {
            if let Some(partial) = err.partial() {
                debug!(
                    received = partial.text.len(),
                    cancelled = err.is_cancelled(),
                    "stream interrupted"
                );
            }
            renderer.render_interrupted();
            return Err(err.into());
        }
    };

    renderer.render_done(&summarize(backend.as_ref(), target.model, completion))?;
    Ok(())
}

/// Result reported for a finished call, named after the backend that served it.
fn summarize(backend: &dyn Backend, model: String, completion: Completion) -> JsonResult {
    JsonResult {
        provider: backend.name().to_string(),
        model,
        usage: completion.usage,
        text: completion.text,
    }
}
