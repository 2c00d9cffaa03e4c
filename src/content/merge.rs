//! Merge commit title and the completion comment.

use chrono::{DateTime, Utc};

use super::{BOT_VERSION, iso_timestamp};

/// Squash commit title used for every merge.
pub const MERGE_COMMIT_TITLE: &str = "Auto-merged by bot with code review";

pub fn completion_comment(merged_at: DateTime<Utc>) -> String {
    format!(
        "## 🎉 PR Successfully Merged!\n\
         \n\
         **Merge Details:**\n\
         - ✅ **Status:** Merged successfully\n\
         - 📅 **Merged at:** {}\n\
         - 🔄 **Merge method:** Squash merge\n\
         - 🤖 **Merged by:** Pull-Merge Bot\n\
         \n\
         ---\n\
         *This PR was automatically created, reviewed, and merged by the Pull-Merge Bot v{BOT_VERSION}*",
        iso_timestamp(merged_at)
    )
}
