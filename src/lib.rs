//! Pull-merge bot: drives a pull request from branch to squash merge using
//! two GitHub accounts.
//!
//! The Proposer commits a dated edit to a working branch and opens (or reuses)
//! a pull request; the Approver approves and merges it. Optional issue
//! creation and code review are gated by a configurable probability.
//!
//! GitHub calls are described as data (`effects`) and executed by an
//! interpreter (`github`), so the lifecycle runs unchanged against an
//! in-memory fake in tests.

pub mod cli;
pub mod config;
pub mod content;
pub mod effects;
pub mod github;
pub mod lifecycle;
pub mod types;

#[cfg(test)]
pub mod test_utils;
