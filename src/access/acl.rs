//! Access control lists and access evaluation
//!
//! An encoded ACL is a concatenation of encoded entries with nothing between
//! them. Evaluation decodes the entries and then applies the following rules
//! in order, stopping at the first that yields a decision:
//!
//! - Unauthenticated requesters use the unauthenticated entry, or get nothing.
//! - The owner uses an owner entry if present, otherwise full access.
//! - A user entry for the requester is used as is.
//! - All group entries matching the requester are merged, the more permissive
//!   verdict winning per privilege. Any match here is final.
//! - An other entry is used.
//! - An authenticated entry is used.
//! - Otherwise nothing is granted.
//!
//! A filter, when given, is applied to the outcome as a ceiling.

use crate::access::ace::Ace;
use crate::access::cursor::EncodedAcl;
use crate::access::principal::{AccessPrincipal, same_account};
use crate::access::privilege::{Privilege, PrivilegeKind};
use crate::access::privilege_set::{PrivilegeSet, PrivilegeStates};
use crate::access::who::{AceWho, WhoKind};
use crate::error::AccessResult;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

/// Rule that produced an access decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// Entry for unauthenticated requesters
    Unauthenticated,
    /// Explicit owner entry
    Owner,
    /// Owner with no owner entry gets full access
    OwnerDefault,
    /// Entry naming the requesting user
    User,
    /// Merge of the requester's group entries
    Group,
    /// Entry for anyone but the owner
    Other,
    /// Entry for any authenticated requester
    Authenticated,
    /// No entry applied
    Default,
}

impl DecisionRule {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DecisionRule::Unauthenticated => "unauthenticated",
            DecisionRule::Owner => "owner",
            DecisionRule::OwnerDefault => "owner_default",
            DecisionRule::User => "user",
            DecisionRule::Group => "group",
            DecisionRule::Other => "other",
            DecisionRule::Authenticated => "authenticated",
            DecisionRule::Default => "default",
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of an access evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAccess {
    desired: Vec<Privilege>,
    privileges: PrivilegeStates,
    access_allowed: bool,
    ace: Option<Ace>,
    rule: DecisionRule,
}

impl CurrentAccess {
    /// Privileges that were asked for; empty means any access
    pub fn desired(&self) -> &[Privilege] {
        &self.desired
    }

    /// Effective verdict for every privilege, after filtering
    pub fn privileges(&self) -> &PrivilegeStates {
        &self.privileges
    }

    /// Whether the desired access is granted
    pub fn access_allowed(&self) -> bool {
        self.access_allowed
    }

    /// Whether an individual privilege is granted
    pub fn is_allowed(&self, kind: PrivilegeKind) -> bool {
        self.privileges.is_allowed(kind)
    }

    /// Entry that determined the outcome, synthetic for merged groups
    pub fn ace(&self) -> Option<&Ace> {
        self.ace.as_ref()
    }

    pub fn rule(&self) -> DecisionRule {
        self.rule
    }
}

/// Ordered list of access control entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    debug: bool,
    aces: Vec<Ace>,
}

impl Acl {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            aces: Vec::new(),
        }
    }

    /// Decode a complete ACL string
    pub fn from_encoded(encoded: &str) -> AccessResult<Self> {
        let mut acl = Self::default();
        acl.decode(&mut EncodedAcl::from(encoded))?;
        Ok(acl)
    }

    pub fn add_ace(&mut self, ace: Ace) {
        self.aces.push(ace);
    }

    pub fn clear(&mut self) {
        self.aces.clear();
    }

    pub fn aces(&self) -> &[Ace] {
        &self.aces
    }

    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    /// Encode all entries in order
    pub fn encode(&self) -> AccessResult<String> {
        let mut acl = EncodedAcl::new();
        for ace in &self.aces {
            ace.encode(&mut acl)?;
        }
        Ok(acl.to_string())
    }

    /// Replace the entries with those decoded from `acl`
    ///
    /// On error the list is left empty.
    pub fn decode(&mut self, acl: &mut EncodedAcl) -> AccessResult<()> {
        self.aces.clear();

        while acl.remaining() > 0 {
            match Ace::decode(acl) {
                Ok(ace) => self.aces.push(ace),
                Err(e) => {
                    self.aces.clear();
                    return Err(e);
                }
            }
        }

        if self.debug {
            debug!(entries = self.aces.len(), acl = %self, "Decoded ACL");
        }

        Ok(())
    }

    /// Decode `acl_chars` and evaluate access against it
    pub fn evaluate_access(
        &mut self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        how: &[Privilege],
        acl_chars: &[char],
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        self.decode(&mut EncodedAcl::from_chars(acl_chars))?;
        Ok(self.evaluate(who, owner, how, filter))
    }

    /// Evaluate access against the entries already held
    pub fn evaluate(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        how: &[Privilege],
        filter: Option<&PrivilegeSet>,
    ) -> CurrentAccess {
        debug!(
            requester = ?who.account(),
            owner = ?owner.account(),
            desired = how.len(),
            filtered = filter.is_some(),
            "Evaluating access"
        );

        let (mut privileges, ace, rule) = self.decide(who, owner);

        if let Some(filter) = filter {
            privileges.restrict_to(&filter.ceiling());
        }

        let access_allowed = if how.is_empty() {
            privileges.any_allowed()
        } else {
            how.iter().all(|p| privileges.is_allowed(p.kind()))
        };

        debug!(rule = %rule, allowed = access_allowed, "Access evaluated");

        CurrentAccess {
            desired: how.to_vec(),
            privileges,
            access_allowed,
            ace,
            rule,
        }
    }

    fn decide(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
    ) -> (PrivilegeStates, Option<Ace>, DecisionRule) {
        if who.is_unauthenticated() {
            return match self.find(WhoKind::Unauthenticated, who, false) {
                Some(ace) => {
                    trace!("Matched unauthenticated entry");
                    (ace.states(), Some(ace.clone()), DecisionRule::Unauthenticated)
                }
                None => {
                    trace!("No unauthenticated entry");
                    (PrivilegeStates::all_denied(), None, DecisionRule::Default)
                }
            };
        }

        let is_owner = same_account(who, owner);

        // 1. Owner
        if is_owner {
            return match self.find(WhoKind::Owner, who, true) {
                Some(ace) => {
                    trace!("Matched owner entry");
                    (ace.states(), Some(ace.clone()), DecisionRule::Owner)
                }
                None => {
                    trace!("Using owner default");
                    (PrivilegeStates::all_allowed(), None, DecisionRule::OwnerDefault)
                }
            };
        }

        // 2. User
        if let Some(ace) = self.find(WhoKind::User, who, is_owner) {
            trace!(who = %ace.who(), "Matched user entry");
            return (ace.states(), Some(ace.clone()), DecisionRule::User);
        }

        // 3. Groups, merged
        let groups: Vec<&Ace> = self
            .aces
            .iter()
            .filter(|ace| {
                ace.who().who_kind() == WhoKind::Group && ace.who().matches(who, is_owner)
            })
            .collect();

        if let Some((first, rest)) = groups.split_first() {
            trace!(entries = groups.len(), "Matched group entries");

            let mut merged = first.states();
            for ace in rest {
                merged.merge_permissive(&ace.states());
            }

            let ace = if rest.is_empty() {
                (*first).clone()
            } else {
                merged_group_ace(&groups, &merged)
            };
            return (merged, Some(ace), DecisionRule::Group);
        }

        // 4. Other
        if let Some(ace) = self.find(WhoKind::Other, who, is_owner) {
            trace!("Matched other entry");
            return (ace.states(), Some(ace.clone()), DecisionRule::Other);
        }

        // 5. Authenticated
        if let Some(ace) = self.find(WhoKind::Authenticated, who, is_owner) {
            trace!("Matched authenticated entry");
            return (ace.states(), Some(ace.clone()), DecisionRule::Authenticated);
        }

        trace!("No entry applies");
        (PrivilegeStates::all_denied(), None, DecisionRule::Default)
    }

    /// First entry of `kind` that applies to the requester
    fn find(&self, kind: WhoKind, who: &dyn AccessPrincipal, is_owner: bool) -> Option<&Ace> {
        self.aces
            .iter()
            .find(|ace| ace.who().who_kind() == kind && ace.who().matches(who, is_owner))
    }
}

/// Synthetic entry describing a merge of several group entries
fn merged_group_ace(groups: &[&Ace], merged: &PrivilegeStates) -> Ace {
    let names = groups
        .iter()
        .filter_map(|ace| ace.who().who())
        .collect::<Vec<_>>()
        .join(", ");

    // Names are joined for display only; this entry is never encoded
    let who = AceWho::group(names);
    Ace::new(who, merged.to_privileges(), None)
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ace) in self.aces.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", ace)?;
        }
        Ok(())
    }
}
