//! Effects-as-data for GitHub operations.
//!
//! Lifecycle phases describe each hosting-service call as a `GitHubEffect`
//! value and hand it to a `GitHubInterpreter`. This enables:
//! - Phase logic that is independent of the transport
//! - Testability via an in-memory fake interpreter
//! - Logging of every intended operation together with its identity

pub mod github;
pub mod interpreter;

pub use github::{
    BranchData, ChangedFile, GitHubEffect, GitHubResponse, PrData, RepositoryData, TreeEntry,
};
pub use interpreter::GitHubInterpreter;
