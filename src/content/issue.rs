//! Issue title, body and labels.

use chrono::{DateTime, Utc};

use super::{BOT_VERSION, Byline, iso_date, iso_timestamp};
use crate::config::{IssueKind, IssueSettings};

/// `<title> - YYYY-MM-DD`
pub fn title(settings: &IssueSettings, at: DateTime<Utc>) -> String {
    format!("{} - {}", settings.title, iso_date(at))
}

pub fn body(settings: &IssueSettings, by: Byline<'_>, at: DateTime<Utc>) -> String {
    format!(
        "{text}\n\
         \n\
         ---\n\
         **Issue Details:**\n\
         - Created by: {owner}\n\
         - Created on: {timestamp}\n\
         - Issue type: {kind}\n\
         - Automated by: Pull-Merge Bot\n\
         \n\
         **Additional Information:**\n\
         - Repository: {repo}\n\
         - Branch: {branch}\n\
         - Bot version: {BOT_VERSION}",
        text = settings.body,
        owner = by.fork_owner,
        timestamp = iso_timestamp(at),
        kind = settings.kind,
        repo = by.repo,
        branch = by.branch,
    )
}

pub fn labels(kind: IssueKind) -> Vec<String> {
    vec![
        kind.as_label().to_string(),
        "automated".to_string(),
        "bot-created".to_string(),
    ]
}
