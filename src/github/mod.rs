//! GitHub API client and effect interpreter.
//!
//! Executes `GitHubEffect`s via the octocrab library by implementing the
//! `GitHubInterpreter` trait from the effects module.
//!
//! Key features:
//! - Exponential backoff retry for transient failures on idempotent calls
//! - Distinguishes transient, not-found and permanent errors
//! - One client per credential, scoped to a single repository

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, RetryPolicy};
