//! GitHub effect interpreter using octocrab.
//!
//! Implements `GitHubInterpreter` for `OctocrabClient` by issuing REST calls
//! through octocrab's raw `get`/`post`/`put`/`patch` helpers, with private
//! request/response structs per endpoint.
//!
//! Key implementation details:
//! - Idempotent effects retry transient failures; creations never retry
//! - 404 on branch and file lookups becomes a "not found" response, not an error
//! - File contents arrive base64-encoded with embedded newlines

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{
    BranchData, ChangedFile, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData,
    RepositoryData, TreeEntry,
};
use crate::types::{
    CommentId, IssueNumber, MergeMethod, Mergeable, PrListState, PrNumber, ReviewEvent, Sha,
};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

const PER_PAGE: u32 = 100;

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let policy = RetryPolicy::for_idempotent(effect.is_idempotent());
        interpret_github_effect(self, effect, RetryConfig::DEFAULT, policy).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
    retry_config: RetryConfig,
    retry_policy: RetryPolicy,
) -> Result<GitHubResponse, GitHubApiError> {
    let kind = effect.kind();
    debug!(repo = %client.repo(), effect = kind, "executing GitHub effect");

    retry_with_backoff(retry_config, retry_policy, kind, || {
        execute_effect(client, effect.clone())
    })
    .await
    .into_result()
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetRepository => get_repository(client).await,
        GitHubEffect::GetBranch { branch } => get_branch(client, &branch).await,
        GitHubEffect::CreateRef { branch, sha } => create_ref(client, &branch, &sha).await,
        GitHubEffect::UpdateRef { branch, sha, force } => {
            update_ref(client, &branch, &sha, force).await
        }
        GitHubEffect::GetFileContent { path, reference } => {
            get_file_content(client, &path, reference).await
        }
        GitHubEffect::GetTree { sha, recursive } => get_tree(client, &sha, recursive).await,
        GitHubEffect::CreateTree { base_tree, entries } => {
            create_tree(client, base_tree, entries).await
        }
        GitHubEffect::CreateCommit {
            message,
            tree,
            parents,
        } => create_commit(client, message, tree, parents).await,
        GitHubEffect::ListPullRequests { state, head, base } => {
            list_pull_requests(client, state, head, base).await
        }
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::CreatePr {
            title,
            body,
            head,
            base,
        } => create_pr(client, title, body, head, base).await,
        GitHubEffect::MergePr {
            pr,
            commit_title,
            method,
        } => merge_pr(client, pr, commit_title, method).await,
        GitHubEffect::ListPrFiles { pr } => list_pr_files(client, pr).await,
        GitHubEffect::CreateReview { pr, body, event } => {
            create_review(client, pr, body, event).await
        }
        GitHubEffect::CreateIssue {
            title,
            body,
            labels,
        } => create_issue(client, title, body, labels).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
    }
}

fn repo_url(client: &OctocrabClient, rest: &str) -> String {
    format!("/repos/{}/{}{}", client.owner(), client.repo_name(), rest)
}

/// `/contents/{path}` with every segment percent-encoded. The `/` separators
/// are kept.
fn contents_path(path: &str) -> String {
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("/contents/{}", encoded.join("/"))
}

/// `/git/refs/heads/{branch}` with the branch as a single encoded segment.
fn branch_ref_path(branch: &str) -> String {
    format!("/git/refs/heads/{}", urlencoding::encode(branch))
}

fn parse_sha(value: &str, what: &str) -> Result<Sha, GitHubApiError> {
    Sha::parse(value)
        .map_err(|e| GitHubApiError::permanent_without_source(format!("invalid {what}: {e}")))
}

// ─── Repository and Branches ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

async fn get_repository(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let url = repo_url(client, "");
    let repo: RepositoryResponse = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Repository(RepositoryData {
        default_branch: repo.default_branch,
    }))
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

async fn get_branch(
    client: &OctocrabClient,
    branch: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    // Branch names may contain '/', which must be encoded in this path segment
    let url = repo_url(
        client,
        &format!("/branches/{}", urlencoding::encode(branch)),
    );

    match client.inner().get::<BranchResponse, _, _>(&url, None::<&()>).await {
        Ok(found) => Ok(GitHubResponse::Branch(BranchData {
            name: found.name,
            head: parse_sha(&found.commit.sha, "branch head SHA")?,
        })),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found() {
                Ok(GitHubResponse::BranchNotFound)
            } else {
                Err(err)
            }
        }
    }
}

async fn create_ref(
    client: &OctocrabClient,
    branch: &str,
    sha: &Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CreateRefRequest {
        #[serde(rename = "ref")]
        ref_name: String,
        sha: String,
    }

    let url = repo_url(client, "/git/refs");
    let request = CreateRefRequest {
        ref_name: format!("refs/heads/{branch}"),
        sha: sha.as_str().to_string(),
    };
    let _: serde_json::Value = client
        .inner()
        .post(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::RefCreated)
}

async fn update_ref(
    client: &OctocrabClient,
    branch: &str,
    sha: &Sha,
    force: bool,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct UpdateRefRequest<'a> {
        sha: &'a str,
        force: bool,
    }

    let url = repo_url(client, &branch_ref_path(branch));
    let _: serde_json::Value = client
        .inner()
        .patch(
            &url,
            Some(&UpdateRefRequest {
                sha: sha.as_str(),
                force,
            }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::RefUpdated)
}

// ─── Contents and Git Data ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Decodes a contents API payload. GitHub wraps the base64 text at 60
/// columns, so whitespace is stripped before decoding.
fn decode_content(raw: &ContentResponse) -> Result<String, GitHubApiError> {
    let Some(content) = raw.content.as_deref() else {
        return Err(GitHubApiError::permanent_without_source(
            "contents response has no content (is the path a directory?)",
        ));
    };
    match raw.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => {
            return Err(GitHubApiError::permanent_without_source(format!(
                "unsupported content encoding {other:?}"
            )));
        }
    }

    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| GitHubApiError::permanent_without_source(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| GitHubApiError::permanent_without_source(format!("file is not UTF-8: {e}")))
}

async fn get_file_content(
    client: &OctocrabClient,
    path: &str,
    reference: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct ContentQuery {
        #[serde(rename = "ref")]
        reference: String,
    }

    let url = repo_url(client, &contents_path(path));
    let result: Result<ContentResponse, _> = client
        .inner()
        .get(&url, Some(&ContentQuery { reference }))
        .await;

    match result {
        Ok(raw) => Ok(GitHubResponse::FileContent {
            content: decode_content(&raw)?,
        }),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found() {
                Ok(GitHubResponse::FileNotFound)
            } else {
                Err(err)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

async fn get_tree(
    client: &OctocrabClient,
    sha: &Sha,
    recursive: bool,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct TreeQuery {
        #[serde(skip_serializing_if = "Option::is_none")]
        recursive: Option<&'static str>,
    }

    let url = repo_url(client, &format!("/git/trees/{sha}"));
    let query = TreeQuery {
        recursive: recursive.then_some("1"),
    };
    let tree: ShaResponse = client
        .inner()
        .get(&url, Some(&query))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Tree {
        sha: parse_sha(&tree.sha, "tree SHA")?,
    })
}

async fn create_tree(
    client: &OctocrabClient,
    base_tree: Sha,
    entries: Vec<TreeEntry>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct TreeRequest {
        base_tree: String,
        tree: Vec<TreeItem>,
    }

    #[derive(Serialize)]
    struct TreeItem {
        path: String,
        mode: String,
        #[serde(rename = "type")]
        kind: &'static str,
        content: String,
    }

    let url = repo_url(client, "/git/trees");
    let request = TreeRequest {
        base_tree: base_tree.as_str().to_string(),
        tree: entries
            .into_iter()
            .map(|entry| TreeItem {
                path: entry.path,
                mode: entry.mode,
                kind: "blob",
                content: entry.content,
            })
            .collect(),
    };
    let created: ShaResponse = client
        .inner()
        .post(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::TreeCreated {
        sha: parse_sha(&created.sha, "tree SHA")?,
    })
}

async fn create_commit(
    client: &OctocrabClient,
    message: String,
    tree: Sha,
    parents: Vec<Sha>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CommitRequest {
        message: String,
        tree: String,
        parents: Vec<String>,
    }

    let url = repo_url(client, "/git/commits");
    let request = CommitRequest {
        message,
        tree: tree.as_str().to_string(),
        parents: parents.iter().map(|p| p.as_str().to_string()).collect(),
    };
    let created: ShaResponse = client
        .inner()
        .post(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommitCreated {
        sha: parse_sha(&created.sha, "commit SHA")?,
    })
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    #[serde(default)]
    title: String,
    user: Option<UserRef>,
    head: BranchRef,
    base: BranchRef,
    #[serde(default)]
    mergeable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

impl From<PullResponse> for PrData {
    fn from(pull: PullResponse) -> Self {
        PrData {
            number: PrNumber(pull.number),
            title: pull.title,
            author: pull.user.map(|u| u.login).unwrap_or_default(),
            head_ref: pull.head.ref_field,
            base_ref: pull.base.ref_field,
            mergeable: Mergeable::from(pull.mergeable),
        }
    }
}

async fn list_pull_requests(
    client: &OctocrabClient,
    state: PrListState,
    head: String,
    base: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct ListQuery<'a> {
        state: &'static str,
        head: &'a str,
        base: &'a str,
        per_page: u32,
        page: u32,
    }

    let url = repo_url(client, "/pulls");
    let mut page = 1u32;
    let mut all_prs = Vec::new();

    loop {
        let query = ListQuery {
            state: state.as_api_str(),
            head: &head,
            base: &base,
            per_page: PER_PAGE,
            page,
        };
        let items: Vec<PullResponse> = client
            .inner()
            .get(&url, Some(&query))
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let is_last_page = items.len() < PER_PAGE as usize;
        all_prs.extend(items.into_iter().map(PrData::from));
        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::PrList(all_prs))
}

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let url = repo_url(client, &format!("/pulls/{}", pr.0));
    let pull: PullResponse = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Pr(pull.into()))
}

async fn create_pr(
    client: &OctocrabClient,
    title: String,
    body: String,
    head: String,
    base: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CreatePrRequest {
        title: String,
        body: String,
        head: String,
        base: String,
    }

    let url = repo_url(client, "/pulls");
    let request = CreatePrRequest {
        title,
        body,
        head,
        base,
    };
    let created: PullResponse = client
        .inner()
        .post(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::PrCreated(created.into()))
}

async fn merge_pr(
    client: &OctocrabClient,
    pr: PrNumber,
    commit_title: String,
    method: MergeMethod,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct MergeRequest {
        commit_title: String,
        merge_method: &'static str,
    }

    #[derive(Debug, Deserialize)]
    struct MergeResponse {
        sha: String,
        #[serde(default)]
        merged: bool,
        #[serde(default)]
        message: String,
    }

    let url = repo_url(client, &format!("/pulls/{}/merge", pr.0));
    let request = MergeRequest {
        commit_title,
        merge_method: method.as_api_str(),
    };
    let merged: MergeResponse = client
        .inner()
        .put(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    if !merged.merged {
        return Err(GitHubApiError::permanent_without_source(format!(
            "PR {pr} was not merged: {}",
            merged.message
        )));
    }

    Ok(GitHubResponse::Merged {
        sha: parse_sha(&merged.sha, "merge commit SHA")?,
    })
}

async fn list_pr_files(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Debug, Deserialize)]
    struct FileResponse {
        filename: String,
        additions: u64,
        deletions: u64,
        changes: u64,
    }

    #[derive(Serialize)]
    struct PageQuery {
        per_page: u32,
        page: u32,
    }

    let url = repo_url(client, &format!("/pulls/{}/files", pr.0));
    let mut page = 1u32;
    let mut files = Vec::new();

    loop {
        let items: Vec<FileResponse> = client
            .inner()
            .get(
                &url,
                Some(&PageQuery {
                    per_page: PER_PAGE,
                    page,
                }),
            )
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let is_last_page = items.len() < PER_PAGE as usize;
        files.extend(items.into_iter().map(|f| ChangedFile {
            path: f.filename,
            additions: f.additions,
            deletions: f.deletions,
            changes: f.changes,
        }));
        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::PrFiles(files))
}

async fn create_review(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
    event: ReviewEvent,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct ReviewRequest {
        body: String,
        event: &'static str,
    }

    let url = repo_url(client, &format!("/pulls/{}/reviews", pr.0));
    let _: serde_json::Value = client
        .inner()
        .post(
            &url,
            Some(&ReviewRequest {
                body,
                event: event.as_api_str(),
            }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::ReviewCreated)
}

// ─── Issues and Comments ──────────────────────────────────────────────────────

async fn create_issue(
    client: &OctocrabClient,
    title: String,
    body: String,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct IssueRequest {
        title: String,
        body: String,
        labels: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    struct IssueResponse {
        number: u64,
        html_url: String,
    }

    let url = repo_url(client, "/issues");
    let created: IssueResponse = client
        .inner()
        .post(
            &url,
            Some(&IssueRequest {
                title,
                body,
                labels,
            }),
        )
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::IssueCreated {
        number: IssueNumber(created.number),
        url: created.html_url,
    })
}

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CommentRequest {
        body: String,
    }

    #[derive(Debug, Deserialize)]
    struct CommentResponse {
        id: u64,
    }

    // PR conversation comments live on the issues endpoint
    let url = repo_url(client, &format!("/issues/{}/comments", pr.0));
    let posted: CommentResponse = client
        .inner()
        .post(&url, Some(&CommentRequest { body }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentPosted {
        id: CommentId(posted.id),
    })
}
