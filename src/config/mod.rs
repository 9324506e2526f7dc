//! Profile files for nuro.
//!
//! A profile is a named set of defaults (provider, model, credential,
//! sampling) stored as TOML, either per project in `./.nuro.toml` or
//! globally at the platform config path (e.g. `~/.config/nuro/config.toml`
//! on Linux). Applying a profile writes the unified `NURO_*` variables into
//! the [`Environment`](crate::env::Environment) snapshot before provider
//! resolution runs.

mod loader;
mod paths;
mod resolve;
mod types;

pub use resolve::apply_profile;
pub use types::ProfileFile;
