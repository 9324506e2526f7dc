//! Centralized constants for nuro.
//!
//! All magic numbers, default strings, and environment variable names live
//! here so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "nuro";

// --- Unified variables (highest precedence) ---

/// Unified credential; when set it beats every provider-specific key.
pub const ENV_API_KEY: &str = "NURO_API_KEY";

/// Unified model identifier.
pub const ENV_MODEL: &str = "NURO_MODEL";

/// Unified provider name.
pub const ENV_PROVIDER: &str = "NURO_PROVIDER";

/// Unified base URL override.
pub const ENV_BASE_URL: &str = "NURO_BASE_URL";

/// Default max output tokens (written by profiles).
pub const ENV_MAX_TOKENS: &str = "NURO_MAX_TOKENS";

/// Default sampling temperature (written by profiles).
pub const ENV_TEMPERATURE: &str = "NURO_TEMPERATURE";

/// Default nucleus top-p (written by profiles).
pub const ENV_TOP_P: &str = "NURO_TOP_P";

/// Prefix marking a `--model` value as an environment variable reference.
pub const MODEL_ENV_SIGIL: char = '$';

// --- Models ---

/// Default LLM model identifier for OpenAI.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default LLM model identifier for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

// --- Endpoints ---

/// Default base URL for the OpenAI API.
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL for a local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model prefixes routed to the OpenAI Responses API instead of chat completions.
pub const RESPONSES_MODEL_PREFIXES: &[&str] = &["o1", "gpt-4.1", "gpt-5"];

/// Responses API model family that rejects `temperature` / `top_p`.
pub const NO_SAMPLING_MODEL_PREFIX: &str = "gpt-5";

// --- Limits ---

/// Maximum characters of an error response body kept for diagnostics.
pub const ERROR_BODY_LIMIT: usize = 400;

/// Maximum characters of a request body echoed to debug logs.
pub const LOG_BODY_LIMIT: usize = 800;

/// Largest data payload accepted from `--data`, `--data-file` or stdin.
pub const MAX_DATA_BYTES: usize = 8 * 1024 * 1024;

// --- CLI defaults ---

/// Max output tokens when neither the flag nor a profile sets one.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Sampling temperature when neither the flag nor a profile sets one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Nucleus top-p when neither the flag nor a profile sets one.
pub const DEFAULT_TOP_P: f64 = 1.0;

/// Request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// --- Configuration ---

/// Per-project profile filename, looked up in the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = ".nuro.toml";

/// Global profile filename inside the platform config directory.
pub const CONFIG_FILENAME: &str = "config.toml";
