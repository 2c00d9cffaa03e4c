//! Simulated code review text.

use crate::effects::{ChangedFile, PrData};

/// Additions above which a code file gets a large-change warning.
pub const LARGE_CHANGE_ADDITIONS: u64 = 50;

/// How a reviewed file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Documentation,
    Code,
}

/// Classifies a path by suffix. Unrecognized files get no note.
pub fn classify(path: &str) -> Option<FileClass> {
    if path.ends_with(".md") {
        Some(FileClass::Documentation)
    } else if [".js", ".ts", ".rs"].iter().any(|ext| path.ends_with(ext)) {
        Some(FileClass::Code)
    } else {
        None
    }
}

/// A per-file note, or `None` for unrecognized or unchanged files.
pub fn file_note(file: &ChangedFile) -> Option<String> {
    let class = classify(&file.path)?;
    if file.changes == 0 {
        return None;
    }

    let mut note = format!(
        "📝 **File Review: {}**\n\n\
         - **Changes:** {} lines\n\
         - **Additions:** {} lines\n\
         - **Deletions:** {} lines\n\n",
        file.path, file.changes, file.additions, file.deletions
    );
    match class {
        FileClass::Documentation => {
            note.push_str("✅ **Documentation Update** - Documentation is being maintained.\n");
            note.push_str(
                "💡 **Suggestion:** Consider adding more context if this is a significant change.\n",
            );
        }
        FileClass::Code => {
            note.push_str("🔧 **Code Changes** - Code modifications detected.\n");
            if file.additions > LARGE_CHANGE_ADDITIONS {
                note.push_str(
                    "⚠️ **Large Change** - This is a substantial modification. Please ensure thorough testing.\n",
                );
            }
            note.push_str("💡 **Suggestion:** Consider adding unit tests for new functionality.\n");
        }
    }
    Some(note)
}

/// The COMMENT review body: PR summary plus one note per reviewed file.
pub fn overview(pr: &PrData, files: &[ChangedFile], reviewer: &str) -> String {
    let notes: Vec<String> = files.iter().filter_map(file_note).collect();
    let total_changes: u64 = files.iter().map(|f| f.changes).sum();
    let notes = if notes.is_empty() {
        "- No significant code changes detected".to_string()
    } else {
        notes.join("\n\n")
    };

    format!(
        "## 🤖 Automated Code Review by {reviewer}\n\
         \n\
         **PR Summary:**\n\
         - **Title:** {title}\n\
         - **Author:** {author}\n\
         - **Files Changed:** {count}\n\
         - **Total Changes:** {total_changes} lines\n\
         \n\
         **Review Notes:**\n\
         {notes}\n\
         \n\
         **Recommendations:**\n\
         - ✅ Code structure looks good\n\
         - ✅ Changes are well-organized\n\
         - 💡 Consider adding tests for new functionality\n\
         - 💡 Update documentation if needed\n\
         \n\
         **Review Status:** ✅ **Ready for Approval**\n\
         \n\
         ---\n\
         *This review was performed automatically by the Pull-Merge Bot for {reviewer}*",
        title = pr.title,
        author = pr.author,
        count = files.len(),
    )
}

/// The APPROVE review body.
pub fn approval(approver: &str) -> String {
    format!("✅ **Approved by {approver}** - Code review completed successfully.")
}
