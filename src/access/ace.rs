//! Access control entry codec
//!
//! ```text
//! ACE := WhoSpec PrivList [ 'I' EncodedString ] ' '
//! ```
//!
//! For example `WONyAI05 /user ` is the owner, allowed all, inherited from
//! `/user`. Inherited entries only appear in ACLs merged during evaluation;
//! they are never stored.

use crate::access::cursor::EncodedAcl;
use crate::access::privilege::Privilege;
use crate::access::privilege_set::{PrivilegeSet, PrivilegeStates};
use crate::access::who::AceWho;
use crate::error::{AccessError, AccessResult};
use std::fmt;

/// Flag introducing the path an entry was inherited from
pub const INHERITED_FLAG: char = 'I';

/// Terminates an entry's privilege list
pub const PRIVILEGE_LIST_END: char = ' ';

/// One (who, privileges) rule of an ACL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ace {
    who: AceWho,
    privileges: Vec<Privilege>,
    inherited_from: Option<String>,
}

impl Ace {
    pub fn new(who: AceWho, privileges: Vec<Privilege>, inherited_from: Option<String>) -> Self {
        Self {
            who,
            privileges,
            inherited_from,
        }
    }

    pub fn who(&self) -> &AceWho {
        &self.who
    }

    /// Privileges in entry order; denials have `is_denial` set
    pub fn privileges(&self) -> &[Privilege] {
        &self.privileges
    }

    /// Path of the entity this entry was merged in from
    pub fn inherited_from(&self) -> Option<&str> {
        self.inherited_from.as_deref()
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited_from.is_some()
    }

    /// Per-privilege verdicts granted by this entry
    pub fn states(&self) -> PrivilegeStates {
        PrivilegeStates::from_privileges(&self.privileges)
    }

    pub fn encode(&self, acl: &mut EncodedAcl) -> AccessResult<()> {
        self.who.encode(acl);

        for p in &self.privileges {
            p.encode(acl)?;
        }

        if let Some(path) = &self.inherited_from {
            acl.add_char(INHERITED_FLAG);
            acl.encode_string(Some(path));
        }

        acl.add_char(PRIVILEGE_LIST_END);
        Ok(())
    }

    /// Decode an entry against the standard privilege tree
    pub fn decode(acl: &mut EncodedAcl) -> AccessResult<Self> {
        Self::decode_with(acl, PrivilegeSet::standard())
    }

    /// Decode an entry against the given privilege dictionary
    pub fn decode_with(acl: &mut EncodedAcl, dictionary: &PrivilegeSet) -> AccessResult<Self> {
        let who = AceWho::decode(acl)?;

        let mut privileges = Vec::new();
        while acl
            .peek()
            .is_some_and(|c| c != PRIVILEGE_LIST_END && c != INHERITED_FLAG)
        {
            let Some(p) = dictionary.find_privilege(acl)? else {
                return Err(AccessError::malformed(
                    "unrecognised privilege in entry",
                    acl.error_info(),
                ));
            };
            privileges.push(p);
        }

        let mut inherited_from = None;
        if acl.peek() == Some(INHERITED_FLAG) {
            acl.get_char()?;
            let Some(path) = acl.decode_string()? else {
                return Err(AccessError::malformed(
                    "inherited flag without a path",
                    acl.error_info(),
                ));
            };
            inherited_from = Some(path);
        }

        if acl.peek() == Some(PRIVILEGE_LIST_END) {
            acl.get_char()?;
        }

        Ok(Self {
            who,
            privileges,
            inherited_from,
        })
    }

    /// Display form, e.g. `group staff: write, NOT read`
    pub fn to_user_string(&self) -> String {
        let privileges = self
            .privileges
            .iter()
            .map(Privilege::to_user_string)
            .collect::<Vec<_>>()
            .join(", ");

        let mut s = format!("{}: {}", self.who, privileges);
        if let Some(path) = &self.inherited_from {
            s.push_str(&format!(" (inherited from {})", path));
        }
        s
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_user_string())
    }
}
