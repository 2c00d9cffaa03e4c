//! Shared test utilities: an in-memory GitHub repository.
//!
//! `FakeGitHub::pair()` returns one handle per identity over the same
//! repository state, so tests can drive a whole run and then inspect the
//! resulting branches, commits and pull requests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{PollConfig, RawConfig, RunConfig};
use crate::effects::{
    BranchData, ChangedFile, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData,
    RepositoryData, TreeEntry,
};
use crate::github::GitHubApiError;
use crate::types::{
    CommentId, Identities, Identity, IssueNumber, Mergeable, PrListState, PrNumber, Sha,
};

/// A run configuration pointing at the fake repository. Issue creation and
/// code review are off; polling does not sleep.
pub fn test_config() -> RunConfig {
    let mut config = RunConfig::from_raw(RawConfig {
        token_a: Some("ghp_proposer_token_0001".to_string()),
        token_b: Some("ghp_approver_token_0002".to_string()),
        repo_owner: Some("owner".to_string()),
        repo_name: Some("repo".to_string()),
        fork_owner: Some("fork-owner".to_string()),
        ..RawConfig::default()
    })
    .unwrap();
    config.poll = PollConfig::immediate(3);
    config
}

struct Commit {
    tree: Sha,
    parents: Vec<Sha>,
}

struct FakePr {
    data: PrData,
    open: bool,
}

struct FakeState {
    next_object: u64,
    /// PRs and issues share one number sequence, as on GitHub.
    next_number: u64,
    default_branch: String,
    branches: BTreeMap<String, Sha>,
    commits: HashMap<Sha, Commit>,
    trees: HashMap<Sha, BTreeMap<String, String>>,
    prs: BTreeMap<PrNumber, FakePr>,
    /// Answers to successive `GetPr` reads. The last one repeats.
    mergeable: VecDeque<Mergeable>,
    pr_files: Vec<ChangedFile>,
    journal: Vec<(Identity, GitHubEffect)>,
    failures: HashMap<Identity, HashSet<&'static str>>,
    denied: HashSet<Identity>,
}

impl FakeState {
    fn new() -> Self {
        let mut state = FakeState {
            next_object: 0,
            next_number: 1,
            default_branch: "main".to_string(),
            branches: BTreeMap::new(),
            commits: HashMap::new(),
            trees: HashMap::new(),
            prs: BTreeMap::new(),
            mergeable: VecDeque::from([Mergeable::Yes]),
            pr_files: vec![ChangedFile {
                path: "README.md".to_string(),
                additions: 11,
                deletions: 0,
                changes: 11,
            }],
            journal: Vec::new(),
            failures: HashMap::new(),
            denied: HashSet::new(),
        };
        let tree = state.store_tree(BTreeMap::from([(
            "README.md".to_string(),
            FakeGitHub::INITIAL_README.to_string(),
        )]));
        let root = state.store_commit(tree, Vec::new());
        state.branches.insert("main".to_string(), root);
        state
    }

    fn fresh_sha(&mut self) -> Sha {
        self.next_object += 1;
        Sha::parse(format!("{:040x}", self.next_object)).unwrap()
    }

    fn store_tree(&mut self, files: BTreeMap<String, String>) -> Sha {
        let sha = self.fresh_sha();
        self.trees.insert(sha.clone(), files);
        sha
    }

    fn store_commit(&mut self, tree: Sha, parents: Vec<Sha>) -> Sha {
        let sha = self.fresh_sha();
        self.commits.insert(sha.clone(), Commit { tree, parents });
        sha
    }

    fn next_number(&mut self) -> u64 {
        let n = self.next_number;
        self.next_number += 1;
        n
    }

    /// Resolves a branch name or commit SHA to the commit's files.
    fn files_at(&self, reference: &str) -> Option<&BTreeMap<String, String>> {
        let commit = match self.branches.get(reference) {
            Some(sha) => sha.clone(),
            None => Sha::parse(reference).ok()?,
        };
        let tree = &self.commits.get(&commit)?.tree;
        self.trees.get(tree)
    }

    fn current_mergeable(&self) -> Mergeable {
        self.mergeable.front().copied().unwrap_or(Mergeable::Yes)
    }

    fn read_mergeable(&mut self) -> Mergeable {
        if self.mergeable.len() > 1 {
            self.mergeable.pop_front().unwrap_or(Mergeable::Yes)
        } else {
            self.current_mergeable()
        }
    }

    fn open_pr(&mut self, head: &str, base: &str) -> PrData {
        let number = PrNumber(self.next_number());
        let data = PrData {
            number,
            title: format!("Update from {head}"),
            author: "fork-owner".to_string(),
            head_ref: head.to_string(),
            base_ref: base.to_string(),
            mergeable: Mergeable::Unknown,
        };
        self.prs.insert(number, FakePr {
            data: data.clone(),
            open: true,
        });
        data
    }

    fn pr(&self, pr: PrNumber) -> Result<&FakePr, GitHubApiError> {
        self.prs.get(&pr).ok_or_else(|| not_found(format!("pull request {pr}")))
    }

    fn apply(&mut self, effect: &GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        match effect {
            GitHubEffect::GetRepository => Ok(GitHubResponse::Repository(RepositoryData {
                default_branch: self.default_branch.clone(),
            })),

            GitHubEffect::GetBranch { branch } => Ok(match self.branches.get(branch) {
                Some(head) => GitHubResponse::Branch(BranchData {
                    name: branch.clone(),
                    head: head.clone(),
                }),
                None => GitHubResponse::BranchNotFound,
            }),

            GitHubEffect::CreateRef { branch, sha } => {
                if self.branches.contains_key(branch) {
                    return Err(unprocessable("Reference already exists"));
                }
                if !self.commits.contains_key(sha) {
                    return Err(unprocessable("Object does not exist"));
                }
                self.branches.insert(branch.clone(), sha.clone());
                Ok(GitHubResponse::RefCreated)
            }

            GitHubEffect::UpdateRef { branch, sha, .. } => {
                if !self.commits.contains_key(sha) {
                    return Err(unprocessable("Object does not exist"));
                }
                match self.branches.get_mut(branch) {
                    Some(head) => {
                        *head = sha.clone();
                        Ok(GitHubResponse::RefUpdated)
                    }
                    None => Err(unprocessable("Reference does not exist")),
                }
            }

            GitHubEffect::GetFileContent { path, reference } => Ok(
                match self.files_at(reference).and_then(|files| files.get(path)) {
                    Some(content) => GitHubResponse::FileContent {
                        content: content.clone(),
                    },
                    None => GitHubResponse::FileNotFound,
                },
            ),

            GitHubEffect::GetTree { sha, .. } => {
                if self.trees.contains_key(sha) {
                    return Ok(GitHubResponse::Tree { sha: sha.clone() });
                }
                match self.commits.get(sha) {
                    Some(commit) => Ok(GitHubResponse::Tree {
                        sha: commit.tree.clone(),
                    }),
                    None => Err(not_found(format!("tree {sha}"))),
                }
            }

            GitHubEffect::CreateTree { base_tree, entries } => {
                let mut files = self
                    .trees
                    .get(base_tree)
                    .cloned()
                    .ok_or_else(|| unprocessable("base_tree is not a valid tree"))?;
                for TreeEntry { path, content, .. } in entries {
                    files.insert(path.clone(), content.clone());
                }
                Ok(GitHubResponse::TreeCreated {
                    sha: self.store_tree(files),
                })
            }

            GitHubEffect::CreateCommit { tree, parents, .. } => {
                if !self.trees.contains_key(tree) {
                    return Err(unprocessable("Tree does not exist"));
                }
                if let Some(missing) = parents.iter().find(|p| !self.commits.contains_key(*p)) {
                    return Err(unprocessable(format!("Parent {missing} does not exist")));
                }
                Ok(GitHubResponse::CommitCreated {
                    sha: self.store_commit(tree.clone(), parents.clone()),
                })
            }

            GitHubEffect::ListPullRequests { state, head, base } => {
                let head_branch = head.split_once(':').map_or(head.as_str(), |(_, b)| b);
                let prs = self
                    .prs
                    .values()
                    .filter(|pr| match state {
                        PrListState::Open => pr.open,
                        PrListState::Closed => !pr.open,
                        PrListState::All => true,
                    })
                    .filter(|pr| pr.data.head_ref == head_branch && pr.data.base_ref == *base)
                    .map(|pr| pr.data.clone())
                    .collect();
                Ok(GitHubResponse::PrList(prs))
            }

            GitHubEffect::GetPr { pr } => {
                let mut data = self.pr(*pr)?.data.clone();
                data.mergeable = self.read_mergeable();
                Ok(GitHubResponse::Pr(data))
            }

            GitHubEffect::CreatePr { head, base, title, .. } => {
                if !self.branches.contains_key(head) {
                    return Err(unprocessable(format!("head branch {head} does not exist")));
                }
                if self
                    .prs
                    .values()
                    .any(|pr| pr.open && pr.data.head_ref == *head && pr.data.base_ref == *base)
                {
                    return Err(unprocessable("A pull request already exists"));
                }
                let mut data = self.open_pr(head, base);
                data.title = title.clone();
                if let Some(pr) = self.prs.get_mut(&data.number) {
                    pr.data.title = title.clone();
                }
                Ok(GitHubResponse::PrCreated(data))
            }

            GitHubEffect::MergePr { pr, .. } => {
                let (head, base) = {
                    let pr = self.pr(*pr)?;
                    if !pr.open {
                        return Err(GitHubApiError::from_status(405, "Pull Request is not mergeable"));
                    }
                    (pr.data.head_ref.clone(), pr.data.base_ref.clone())
                };
                if self.current_mergeable() == Mergeable::No {
                    return Err(GitHubApiError::from_status(405, "Pull Request is not mergeable"));
                }
                let head_sha = self
                    .branches
                    .get(&head)
                    .cloned()
                    .ok_or_else(|| unprocessable(format!("head branch {head} does not exist")))?;
                let base_sha = self
                    .branches
                    .get(&base)
                    .cloned()
                    .ok_or_else(|| unprocessable(format!("base branch {base} does not exist")))?;
                let tree = self.commits[&head_sha].tree.clone();
                let squashed = self.store_commit(tree, vec![base_sha]);
                self.branches.insert(base, squashed.clone());
                if let Some(pr) = self.prs.get_mut(pr) {
                    pr.open = false;
                }
                Ok(GitHubResponse::Merged { sha: squashed })
            }

            GitHubEffect::ListPrFiles { pr } => {
                self.pr(*pr)?;
                Ok(GitHubResponse::PrFiles(self.pr_files.clone()))
            }

            GitHubEffect::CreateReview { pr, .. } => {
                self.pr(*pr)?;
                Ok(GitHubResponse::ReviewCreated)
            }

            GitHubEffect::CreateIssue { .. } => {
                let number = self.next_number();
                Ok(GitHubResponse::IssueCreated {
                    number: IssueNumber(number),
                    url: format!("https://github.com/owner/repo/issues/{number}"),
                })
            }

            GitHubEffect::PostComment { pr, .. } => {
                self.pr(*pr)?;
                let id = self.next_number();
                Ok(GitHubResponse::CommentPosted { id: CommentId(id) })
            }
        }
    }
}

fn not_found(what: String) -> GitHubApiError {
    GitHubApiError::from_status(404, format!("Not Found: {what}"))
}

fn unprocessable(message: impl Into<String>) -> GitHubApiError {
    GitHubApiError::from_status(422, message)
}

/// One identity's view of a shared in-memory repository.
#[derive(Clone)]
pub struct FakeGitHub {
    state: Arc<Mutex<FakeState>>,
    identity: Identity,
}

impl FakeGitHub {
    /// Content of `README.md` on the initial commit of `main`.
    pub const INITIAL_README: &'static str = "# Project\n\nInitial readme.\n";

    /// A Proposer and an Approver over a repository whose `main` branch has
    /// one commit.
    pub fn pair() -> Identities<FakeGitHub> {
        let state = Arc::new(Mutex::new(FakeState::new()));
        Identities::new(
            FakeGitHub {
                state: Arc::clone(&state),
                identity: Identity::Proposer,
            },
            FakeGitHub {
                state,
                identity: Identity::Approver,
            },
        )
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Makes every call of `kind` by this identity fail permanently.
    pub fn fail(&self, kind: &'static str) {
        self.state()
            .failures
            .entry(self.identity)
            .or_default()
            .insert(kind);
    }

    /// Makes every call by this identity answer 404, like a token without
    /// access to a private repository.
    pub fn deny_access(&self) {
        self.state().denied.insert(self.identity);
    }

    /// Sets the answers to successive PR reads. The last one repeats.
    pub fn script_mergeable(&self, script: impl IntoIterator<Item = Mergeable>) {
        let script: VecDeque<_> = script.into_iter().collect();
        assert!(!script.is_empty(), "mergeable script must not be empty");
        self.state().mergeable = script;
    }

    /// Every effect issued so far, by either identity, in order.
    pub fn journal(&self) -> Vec<(Identity, GitHubEffect)> {
        self.state().journal.clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.state().journal.iter().map(|(_, e)| e.kind()).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.state()
            .journal
            .iter()
            .filter(|(_, e)| e.kind() == kind)
            .count()
    }

    pub fn branch_head(&self, branch: &str) -> Option<Sha> {
        self.state().branches.get(branch).cloned()
    }

    /// Commits a stale file on `branch`, starting from `from`'s head. Creates
    /// `branch` if needed.
    pub fn add_commit_on(&self, branch: &str, from: &str, message: &str) -> Sha {
        let mut state = self.state();
        let parent = state.branches[from].clone();
        let mut files = state.trees[&state.commits[&parent].tree].clone();
        files.insert("STALE.md".to_string(), message.to_string());
        let tree = state.store_tree(files);
        let sha = state.store_commit(tree, vec![parent]);
        state.branches.insert(branch.to_string(), sha.clone());
        sha
    }

    pub fn commit_parents(&self, commit: &Sha) -> Vec<Sha> {
        self.state().commits[commit].parents.clone()
    }

    /// A file's content at a branch head.
    pub fn file_at(&self, branch: &str, path: &str) -> Option<String> {
        self.state().files_at(branch)?.get(path).cloned()
    }

    /// Opens a PR directly, without checking that `head` exists.
    pub fn open_pr(&self, head: &str, base: &str) -> PrNumber {
        self.state().open_pr(head, base).number
    }

    pub fn pr(&self, number: PrNumber) -> PrData {
        self.state().prs[&number].data.clone()
    }

    pub fn open_prs(&self) -> Vec<PrData> {
        self.state()
            .prs
            .values()
            .filter(|pr| pr.open)
            .map(|pr| pr.data.clone())
            .collect()
    }
}

impl GitHubInterpreter for FakeGitHub {
    type Error = GitHubApiError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let mut state = self.state();
        state.journal.push((self.identity, effect.clone()));

        let result = if state.denied.contains(&self.identity) {
            Err(not_found(format!("{} as {}", effect.kind(), self.identity)))
        } else if state
            .failures
            .get(&self.identity)
            .is_some_and(|kinds| kinds.contains(effect.kind()))
        {
            Err(GitHubApiError::permanent_without_source(format!(
                "injected {} failure",
                effect.kind()
            )))
        } else {
            state.apply(&effect)
        };
        drop(state);

        std::future::ready(result)
    }
}
