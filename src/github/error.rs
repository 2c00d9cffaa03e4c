//! GitHub API error types.
//!
//! Failures are split by what the caller can do about them:
//!
//! - **Transient** errors are retriable (5xx, rate limits, network trouble)
//! - **NotFound** (HTTP 404) is its own kind: GitHub answers 404 both for
//!   missing objects and for repositories the token cannot see, and several
//!   effects map it to a "not found" response instead of an error
//! - **Permanent** errors need a human (auth failures, validation errors,
//!   merge refusals)

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Safe to retry with backoff.
    ///
    /// Examples:
    /// - HTTP 5xx (server errors)
    /// - HTTP 429 (rate limited)
    /// - HTTP 403 with a rate limit message
    /// - Network timeouts
    Transient,

    /// HTTP 404.
    NotFound,

    /// Everything else.
    ///
    /// Examples:
    /// - HTTP 401 (bad credentials)
    /// - HTTP 403 without a rate limit message
    /// - HTTP 405 "Pull Request is not mergeable"
    /// - HTTP 422 validation failures
    Permanent,
}

impl GitHubErrorKind {
    /// Returns true if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A GitHub API error with categorization for retry decisions.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The kind of error.
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates a permanent error without an octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for a known HTTP status, categorized the same way a
    /// real API response with that status would be.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: categorize(Some(status), &message),
            status_code: Some(status),
            message,
            source: None,
        }
    }

    /// The interpreter answered an effect with the wrong response variant.
    ///
    /// Only reachable through a bug in an interpreter, so it is permanent.
    pub fn unexpected_response(effect: &str, response: impl fmt::Debug) -> Self {
        Self::permanent_without_source(format!(
            "unexpected response to {effect}: {response:?}"
        ))
    }

    /// Categorizes an octocrab error.
    ///
    /// The status code comes from octocrab's structured `GitHubError` when the
    /// API returned one; otherwise the message is inspected.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = Self::extract_status_code(&err);
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };
        Self {
            kind: categorize(status_code, &message),
            status_code,
            message,
            source: Some(err),
        }
    }

    /// Returns true if the API answered 404.
    pub fn is_not_found(&self) -> bool {
        self.kind == GitHubErrorKind::NotFound
    }

    /// Returns true if the API rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(401)
    }

    /// Extracts the HTTP status code from an octocrab error, if present.
    ///
    /// Errors that never reached the API (transport, serde) have no status,
    /// but their rendered message sometimes carries one from an intermediary.
    fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
        if let octocrab::Error::GitHub { source, .. } = err {
            return Some(source.status_code.as_u16());
        }
        status_from_message(&err.to_string())
    }
}

fn categorize(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    match status_code {
        Some(404) => GitHubErrorKind::NotFound,
        Some(429) => GitHubErrorKind::Transient,
        Some(403) if is_rate_limit_error(message) => GitHubErrorKind::Transient,
        Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
        Some(_) if is_transient_message(message) => GitHubErrorKind::Transient,
        Some(_) => GitHubErrorKind::Permanent,
        None if is_network_error(message) || is_transient_message(message) => {
            GitHubErrorKind::Transient
        }
        None => GitHubErrorKind::Permanent,
    }
}

/// Pulls a status code out of a rendered error message.
fn status_from_message(message: &str) -> Option<u16> {
    if let Some(idx) = message.find("status: ") {
        let digits: String = message[idx + 8..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse() {
            return Some(code);
        }
    }

    let lower = message.to_lowercase();
    if message.contains("404") && lower.contains("not found") {
        return Some(404);
    }
    [401, 403, 422, 429, 500, 502, 503]
        .into_iter()
        .find(|code| message.contains(&code.to_string()))
}

/// Checks if an error message indicates a transient condition.
fn is_transient_message(message: &str) -> bool {
    let message_lower = message.to_lowercase();

    // Base branch moved between our read and the merge
    if message_lower.contains("base branch was modified") {
        return true;
    }

    // Generic "try again" suggestions from GitHub
    message_lower.contains("try again")
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
///
/// octocrab renders transport failures as `Service Error: client error
/// (Connect)` and the like.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connect")
        || message_lower.contains("service error")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_message_detection() {
        assert!(is_transient_message("Base branch was modified"));
        assert!(is_transient_message("Please try again later"));
        assert!(!is_transient_message("Pull Request is not mergeable"));
    }

    #[test]
    fn rate_limit_detection() {
        assert!(is_rate_limit_error("API rate limit exceeded"));
        assert!(is_rate_limit_error("secondary rate limit"));
        assert!(is_rate_limit_error("abuse detection mechanism"));
        assert!(!is_rate_limit_error("Permission denied"));
    }

    #[test]
    fn network_error_detection() {
        assert!(is_network_error("connection timeout"));
        assert!(is_network_error("DNS resolution failed"));
        assert!(is_network_error("request timed out"));
        assert!(!is_network_error("Not found"));
    }

    #[test]
    fn refused_connection_is_transient() {
        let message = "Service Error: client error (Connect)";
        assert!(is_network_error(message));
        assert_eq!(categorize(None, message), GitHubErrorKind::Transient);
        assert_eq!(categorize(None, "Uri"), GitHubErrorKind::Permanent);
    }

    #[test]
    fn status_categorization() {
        assert_eq!(categorize(Some(404), "Not Found"), GitHubErrorKind::NotFound);
        assert_eq!(categorize(Some(429), ""), GitHubErrorKind::Transient);
        assert_eq!(categorize(Some(502), ""), GitHubErrorKind::Transient);
        assert_eq!(
            categorize(Some(403), "API rate limit exceeded"),
            GitHubErrorKind::Transient
        );
        assert_eq!(
            categorize(Some(403), "Resource not accessible"),
            GitHubErrorKind::Permanent
        );
        assert_eq!(
            categorize(Some(405), "Pull Request is not mergeable"),
            GitHubErrorKind::Permanent
        );
        assert_eq!(
            categorize(Some(409), "Base branch was modified. Review and try the merge again."),
            GitHubErrorKind::Transient
        );
        assert_eq!(categorize(None, "connection reset"), GitHubErrorKind::Transient);
        assert_eq!(categorize(None, "invalid json"), GitHubErrorKind::Permanent);
    }

    #[test]
    fn status_parsed_from_message() {
        assert_eq!(status_from_message("HTTP status: 502 Bad Gateway"), Some(502));
        assert_eq!(status_from_message("404 Not Found"), Some(404));
        assert_eq!(status_from_message("something odd"), None);
    }

    #[test]
    fn from_status_helpers() {
        let err = GitHubApiError::from_status(404, "Not Found");
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "GitHub API error (HTTP 404): Not Found");

        let err = GitHubApiError::from_status(401, "Bad credentials");
        assert!(err.is_unauthorized());
        assert_eq!(err.kind, GitHubErrorKind::Permanent);
    }

    #[test]
    fn error_kind_retriable() {
        assert!(GitHubErrorKind::Transient.is_retriable());
        assert!(!GitHubErrorKind::Permanent.is_retriable());
        assert!(!GitHubErrorKind::NotFound.is_retriable());
    }
}
