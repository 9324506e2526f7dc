//! Entry point for nuro, one-shot LLM completions from the terminal.
//!
//! This binary loads `.env` files, parses CLI arguments via [`cli`], runs a
//! single completion and maps failures onto the process exit status.

mod cli;
mod completion;
mod config;
mod constants;
mod env;
mod error;
mod logging;
mod output;
mod provider;

use std::process::ExitCode;

use colored::Colorize;

/// Runs the nuro CLI.
///
/// Loads `.env` files (silently ignored if absent), parses command-line
/// arguments into a [`cli::Cli`] struct and runs it via [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "nuro:".red().bold());
            ExitCode::from(error::exit_code(&err))
        }
    }
}
