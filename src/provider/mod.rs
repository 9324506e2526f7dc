//! Provider resolution for nuro.
//!
//! Turns a `--model` argument plus an [`Environment`](crate::env::Environment)
//! snapshot into a [`ResolvedTarget`]: which provider, which model, which
//! credential. The static tables behind auto-discovery and model-name hints
//! live in [`catalog`].

pub mod catalog;
mod kind;
mod resolve;

pub use kind::ProviderKind;
pub use resolve::{resolve, ResolvedTarget};
