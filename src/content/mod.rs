//! Text generated by the bot.
//!
//! Every body, title and message the bot sends is built here by a pure
//! function. Clock readings are passed in, so output depends only on inputs.

pub mod issue;
pub mod merge;
pub mod pull_request;
pub mod readme;
pub mod review;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::RunConfig;
use crate::types::RepoId;

/// Version stamped into generated text.
pub const BOT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Who is acting, where. Shared by most generated text.
#[derive(Debug, Clone, Copy)]
pub struct Byline<'a> {
    pub fork_owner: &'a str,
    pub repo: &'a RepoId,
    pub branch: &'a str,
    pub file_path: &'a str,
}

impl<'a> Byline<'a> {
    pub fn from_config(config: &'a RunConfig) -> Self {
        Byline {
            fork_owner: &config.fork_owner,
            repo: &config.repo,
            branch: &config.branch,
            file_path: &config.file_path,
        }
    }
}

/// `2024-05-01T12:30:00.000Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `2024-05-01`
pub fn iso_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
