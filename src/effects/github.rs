//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! An interpreter (see `crate::github`) executes them against the real API; the
//! tests execute them against an in-memory fake.

use serde::{Deserialize, Serialize};

use crate::types::{
    CommentId, IssueNumber, MergeMethod, Mergeable, PrListState, PrNumber, ReviewEvent, Sha,
};

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed with a `RepoId`, so
/// effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Repository ───────────────────────────────────────────────────────────
    /// Fetch repository metadata. Doubles as the read-access check.
    GetRepository,

    // ─── Branches and refs ────────────────────────────────────────────────────
    /// Look up a branch and its head commit.
    GetBranch { branch: String },

    /// Create `refs/heads/{branch}` pointing at `sha`.
    CreateRef { branch: String, sha: Sha },

    /// Move `refs/heads/{branch}` to `sha`. With `force`, non-fast-forward
    /// updates are allowed.
    UpdateRef {
        branch: String,
        sha: Sha,
        force: bool,
    },

    // ─── Contents and git data ────────────────────────────────────────────────
    /// Read a file's contents at a ref (branch name or SHA).
    GetFileContent { path: String, reference: String },

    /// Resolve a tree. `sha` may be a tree SHA or a commit SHA, in which case
    /// the commit's root tree is returned.
    GetTree { sha: Sha, recursive: bool },

    /// Create a tree from `base_tree` plus the given entries.
    CreateTree {
        base_tree: Sha,
        entries: Vec<TreeEntry>,
    },

    /// Create a commit object.
    CreateCommit {
        message: String,
        tree: Sha,
        parents: Vec<Sha>,
    },

    // ─── Pull requests ────────────────────────────────────────────────────────
    /// List pull requests filtered by state, head (`owner:branch`) and base.
    ListPullRequests {
        state: PrListState,
        head: String,
        base: String,
    },

    /// Fetch a single PR by number, including its mergeability.
    GetPr { pr: PrNumber },

    /// Open a new pull request.
    CreatePr {
        title: String,
        body: String,
        head: String,
        base: String,
    },

    /// Merge a PR into its base branch.
    MergePr {
        pr: PrNumber,
        commit_title: String,
        method: MergeMethod,
    },

    /// List the files changed by a PR.
    ListPrFiles { pr: PrNumber },

    /// Submit a review on a PR.
    CreateReview {
        pr: PrNumber,
        body: String,
        event: ReviewEvent,
    },

    // ─── Issues and comments ──────────────────────────────────────────────────
    /// Open a new issue.
    CreateIssue {
        title: String,
        body: String,
        labels: Vec<String>,
    },

    /// Post a comment on a PR's conversation.
    PostComment { pr: PrNumber, body: String },
}

impl GitHubEffect {
    /// A short, stable name for logging and test assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            GitHubEffect::GetRepository => "get_repository",
            GitHubEffect::GetBranch { .. } => "get_branch",
            GitHubEffect::CreateRef { .. } => "create_ref",
            GitHubEffect::UpdateRef { .. } => "update_ref",
            GitHubEffect::GetFileContent { .. } => "get_file_content",
            GitHubEffect::GetTree { .. } => "get_tree",
            GitHubEffect::CreateTree { .. } => "create_tree",
            GitHubEffect::CreateCommit { .. } => "create_commit",
            GitHubEffect::ListPullRequests { .. } => "list_pull_requests",
            GitHubEffect::GetPr { .. } => "get_pr",
            GitHubEffect::CreatePr { .. } => "create_pr",
            GitHubEffect::MergePr { .. } => "merge_pr",
            GitHubEffect::ListPrFiles { .. } => "list_pr_files",
            GitHubEffect::CreateReview { .. } => "create_review",
            GitHubEffect::CreateIssue { .. } => "create_issue",
            GitHubEffect::PostComment { .. } => "post_comment",
        }
    }

    /// Returns true if executing the effect twice has the same result as
    /// executing it once.
    ///
    /// Only idempotent effects are retried on transient failures: a retried
    /// `CreatePr` whose first attempt actually landed would open a duplicate.
    pub fn is_idempotent(&self) -> bool {
        match self {
            GitHubEffect::GetRepository
            | GitHubEffect::GetBranch { .. }
            | GitHubEffect::GetFileContent { .. }
            | GitHubEffect::GetTree { .. }
            | GitHubEffect::ListPullRequests { .. }
            | GitHubEffect::GetPr { .. }
            | GitHubEffect::ListPrFiles { .. } => true,
            // Moving a ref to a fixed SHA converges.
            GitHubEffect::UpdateRef { .. } => true,
            GitHubEffect::CreateRef { .. }
            | GitHubEffect::CreateTree { .. }
            | GitHubEffect::CreateCommit { .. }
            | GitHubEffect::CreatePr { .. }
            | GitHubEffect::MergePr { .. }
            | GitHubEffect::CreateReview { .. }
            | GitHubEffect::CreateIssue { .. }
            | GitHubEffect::PostComment { .. } => false,
        }
    }
}

// ─── Data Types ───────────────────────────────────────────────────────────────

/// A single blob entry for `CreateTree`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root.
    pub path: String,
    /// File mode, e.g. `100644` for a regular file.
    pub mode: String,
    /// Full file content. GitHub creates the blob from it.
    pub content: String,
}

impl TreeEntry {
    /// A regular (non-executable) file.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        TreeEntry {
            path: path.into(),
            mode: "100644".to_string(),
            content: content.into(),
        }
    }
}

/// Repository metadata returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryData {
    /// The repository's default branch.
    pub default_branch: String,
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchData {
    pub name: String,
    pub head: Sha,
}

/// PR data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    /// The PR number.
    pub number: PrNumber,
    /// The PR title.
    pub title: String,
    /// Login of the PR author.
    pub author: String,
    /// The head branch name.
    pub head_ref: String,
    /// The base branch name.
    pub base_ref: String,
    /// GitHub's mergeability verdict. Always `Unknown` in list responses,
    /// which don't compute it.
    pub mergeable: Mergeable,
}

/// A file touched by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
    /// Additions plus deletions, as reported by GitHub.
    pub changes: u64,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetRepository`.
    Repository(RepositoryData),

    /// Response to `GetBranch` when the branch exists.
    Branch(BranchData),

    /// Response to `GetBranch` when the API returns 404.
    BranchNotFound,

    /// Response to `CreateRef`.
    RefCreated,

    /// Response to `UpdateRef`.
    RefUpdated,

    /// Response to `GetFileContent`, decoded to UTF-8.
    FileContent { content: String },

    /// Response to `GetFileContent` when the API returns 404.
    FileNotFound,

    /// Response to `GetTree`.
    Tree { sha: Sha },

    /// Response to `CreateTree`.
    TreeCreated { sha: Sha },

    /// Response to `CreateCommit`.
    CommitCreated { sha: Sha },

    /// Response to `ListPullRequests`.
    PrList(Vec<PrData>),

    /// Response to `GetPr`.
    Pr(PrData),

    /// Response to `CreatePr`.
    PrCreated(PrData),

    /// Response to `MergePr`.
    Merged {
        /// The SHA of the commit created on the base branch.
        sha: Sha,
    },

    /// Response to `ListPrFiles`.
    PrFiles(Vec<ChangedFile>),

    /// Response to `CreateReview`.
    ReviewCreated,

    /// Response to `CreateIssue`.
    IssueCreated { number: IssueNumber, url: String },

    /// Response to `PostComment`.
    CommentPosted { id: CommentId },
}
