//! Pull request title and body.

use chrono::{DateTime, Utc};

use super::{BOT_VERSION, Byline, iso_date, iso_timestamp};

pub fn title(by: Byline<'_>, at: DateTime<Utc>) -> String {
    format!(
        "🤖 Automated PR: Update {} from {} - {}",
        by.file_path,
        by.branch,
        iso_date(at)
    )
}

pub fn body(by: Byline<'_>, at: DateTime<Utc>) -> String {
    let timestamp = iso_timestamp(at);
    format!(
        "## 🤖 Automated Pull Request\n\
         \n\
         This PR was created automatically by the pull-merge bot.\n\
         \n\
         ### 📋 Changes Summary\n\
         - **Updated {path}** with timestamp and bot information\n\
         - **Automated commit** by {owner}\n\
         - **Branch:** {branch}\n\
         - **Created:** {timestamp}\n\
         \n\
         ### 🔍 What Changed\n\
         - Added timestamp section to {path}\n\
         - Updated documentation with bot activity\n\
         \n\
         ### 🤖 Bot Information\n\
         - **Bot Version:** {BOT_VERSION}\n\
         - **Created by:** {owner}\n\
         - **Repository:** {repo}\n\
         - **Branch:** {branch}\n\
         \n\
         ---\n\
         *This PR will be automatically reviewed and merged by the bot.*",
        path = by.file_path,
        owner = by.fork_owner,
        branch = by.branch,
        repo = by.repo,
    )
}
