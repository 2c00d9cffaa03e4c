//! The two credentialed identities the bot acts under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which account an operation is performed as.
///
/// The Proposer owns the working branch: it pushes commits, opens the pull
/// request, leaves the comment review, and posts the completion comment. The
/// Approver stands in for the repository owner: it approves and merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Proposer,
    Approver,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Proposer => write!(f, "proposer"),
            Identity::Approver => write!(f, "approver"),
        }
    }
}

/// One value per identity.
///
/// Used for the pair of hosting clients so that every call site has to name
/// the identity it acts as.
#[derive(Debug, Clone)]
pub struct Identities<T> {
    pub proposer: T,
    pub approver: T,
}

impl<T> Identities<T> {
    pub fn new(proposer: T, approver: T) -> Self {
        Identities { proposer, approver }
    }

    /// Returns the value for the given identity.
    pub fn get(&self, identity: Identity) -> &T {
        match identity {
            Identity::Proposer => &self.proposer,
            Identity::Approver => &self.approver,
        }
    }
}
