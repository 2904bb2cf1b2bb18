//! Requesting principals
//!
//! Evaluation only ever asks three questions about the requester: which
//! account it is, whether it is authenticated, and whether it belongs to a
//! named group. [`AccessPrincipal`] is that capability; how membership is
//! resolved is up to the implementor.

use crate::config::DirectoryConfig;
use std::collections::{BTreeSet, HashMap};

/// Identity capability consumed by the evaluator
pub trait AccessPrincipal {
    /// Account name, `None` for an unauthenticated requester
    fn account(&self) -> Option<&str>;

    /// Whether the requester is a member of `group`
    fn is_member_of(&self, group: &str) -> bool;

    fn is_unauthenticated(&self) -> bool {
        self.account().is_none()
    }
}

/// Whether two principals are the same authenticated account
pub fn same_account(a: &dyn AccessPrincipal, b: &dyn AccessPrincipal) -> bool {
    match (a.account(), b.account()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Principal with an explicit group list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    account: Option<String>,
    groups: BTreeSet<String>,
}

impl Principal {
    /// An authenticated account with no groups
    pub fn user(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            groups: BTreeSet::new(),
        }
    }

    /// The unauthenticated guest
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Add group memberships
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }
}

impl AccessPrincipal for Principal {
    fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    fn is_member_of(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

/// Static group directory built from configuration
#[derive(Debug, Clone, Default)]
pub struct Directory {
    members: HashMap<String, BTreeSet<String>>,
}

impl Directory {
    pub fn new(config: &DirectoryConfig) -> Self {
        let members = config
            .groups
            .iter()
            .map(|(group, accounts)| (group.clone(), accounts.iter().cloned().collect()))
            .collect();
        Self { members }
    }

    /// Groups `account` belongs to, sorted
    pub fn groups_of(&self, account: &str) -> Vec<&str> {
        let mut groups: Vec<&str> = self
            .members
            .iter()
            .filter(|(_, accounts)| accounts.contains(account))
            .map(|(group, _)| group.as_str())
            .collect();
        groups.sort_unstable();
        groups
    }

    /// Resolve a principal, `None` meaning unauthenticated
    pub fn principal(&self, account: Option<&str>) -> Principal {
        match account {
            Some(account) => Principal::user(account).with_groups(self.groups_of(account)),
            None => Principal::unauthenticated(),
        }
    }
}
