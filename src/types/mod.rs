//! Core domain types for the pull-merge bot.
//!
//! Identifiers are newtypes so that PR numbers, issue numbers and SHAs cannot
//! be mixed up at call sites.

pub mod identity;
pub mod ids;
pub mod pr;

pub use identity::{Identities, Identity};
pub use ids::{CommentId, InvalidSha, IssueNumber, PrNumber, RepoId, Sha};
pub use pr::{MergeMethod, Mergeable, PrListState, ReviewEvent};
