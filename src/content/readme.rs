//! The file edit committed on every run.

use chrono::{DateTime, Utc};

use super::{Byline, iso_timestamp};

/// Heading of the generated section.
pub const SECTION_HEADING: &str = "## Last Updated by Bot";

/// Prepends a dated "Last Updated by Bot" section to `existing`.
///
/// Earlier sections are kept below the new one, so the file grows by one
/// section per run.
pub fn prepend_update_section(existing: &str, by: Byline<'_>, at: DateTime<Utc>) -> String {
    let timestamp = iso_timestamp(at);
    format!(
        "{SECTION_HEADING}\n\
         \n\
         This section was automatically updated by the pull-merge bot on {timestamp}.\n\
         \n\
         ### Changes Made:\n\
         - Automated {path} update\n\
         - Timestamp: {timestamp}\n\
         - Updated by: {owner}\n\
         - Branch: {branch}\n\
         \n\
         {existing}",
        path = by.file_path,
        owner = by.fork_owner,
        branch = by.branch,
    )
}

/// Commit message for the edit.
pub fn commit_message(by: Byline<'_>) -> String {
    format!(
        "Update {} - Automated edit by {} on {}",
        by.file_path, by.fork_owner, by.branch
    )
}
