//! Who specifier codec
//!
//! The subject of an access control entry is encoded as:
//!
//! ```text
//! byte 1    polarity     W = who, N = not who
//! byte 2    kind         O = owner           U = user
//!                        G = group           H = host
//!                        X = unauthenticated A = authenticated
//!                        Z = other           L = all
//! byte 3..  name         length prefixed string, N if the kind has no name
//! ```

use crate::access::cursor::EncodedAcl;
use crate::access::principal::AccessPrincipal;
use crate::error::{AccessError, AccessResult};
use serde::Serialize;
use std::fmt;

/// Polarity flag for an entry that applies when the who matches
pub const WHO_FLAG: char = 'W';

/// Polarity flag for an entry that applies when the who does not match
pub const NOT_WHO_FLAG: char = 'N';

/// Kind of subject an entry names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WhoKind {
    Owner,
    User,
    Group,
    Host,
    Unauthenticated,
    Authenticated,
    Other,
    All,
}

impl WhoKind {
    /// Single character encoding of this kind
    pub const fn encoding(self) -> char {
        match self {
            WhoKind::Owner => 'O',
            WhoKind::User => 'U',
            WhoKind::Group => 'G',
            WhoKind::Host => 'H',
            WhoKind::Unauthenticated => 'X',
            WhoKind::Authenticated => 'A',
            WhoKind::Other => 'Z',
            WhoKind::All => 'L',
        }
    }

    pub fn from_encoding(c: char) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.encoding() == c)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            WhoKind::Owner => "owner",
            WhoKind::User => "user",
            WhoKind::Group => "group",
            WhoKind::Host => "host",
            WhoKind::Unauthenticated => "unauthenticated",
            WhoKind::Authenticated => "authenticated",
            WhoKind::Other => "other",
            WhoKind::All => "all",
        }
    }

    /// Whether entries of this kind carry a name
    pub const fn takes_name(self) -> bool {
        matches!(self, WhoKind::User | WhoKind::Group | WhoKind::Host)
    }

    pub fn all() -> &'static [WhoKind] {
        &[
            WhoKind::Owner,
            WhoKind::User,
            WhoKind::Group,
            WhoKind::Host,
            WhoKind::Unauthenticated,
            WhoKind::Authenticated,
            WhoKind::Other,
            WhoKind::All,
        ]
    }
}

impl fmt::Display for WhoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subject of an access control entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AceWho {
    who: Option<String>,
    who_kind: WhoKind,
    not_who: bool,
}

impl AceWho {
    /// Create a who specifier, checking the name against the kind
    pub fn new(who: Option<String>, who_kind: WhoKind, not_who: bool) -> AccessResult<Self> {
        match (&who, who_kind.takes_name()) {
            (None, true) => Err(AccessError::invalid_state(format!(
                "who kind '{}' requires a name",
                who_kind
            ))),
            (Some(name), false) => Err(AccessError::invalid_state(format!(
                "who kind '{}' does not take a name, got '{}'",
                who_kind, name
            ))),
            _ => Ok(Self {
                who,
                who_kind,
                not_who,
            }),
        }
    }

    const fn unnamed(who_kind: WhoKind) -> Self {
        Self {
            who: None,
            who_kind,
            not_who: false,
        }
    }

    fn named(who_kind: WhoKind, name: impl Into<String>) -> Self {
        Self {
            who: Some(name.into()),
            who_kind,
            not_who: false,
        }
    }

    pub const fn owner() -> Self {
        Self::unnamed(WhoKind::Owner)
    }

    pub const fn unauthenticated() -> Self {
        Self::unnamed(WhoKind::Unauthenticated)
    }

    pub const fn authenticated() -> Self {
        Self::unnamed(WhoKind::Authenticated)
    }

    pub const fn other() -> Self {
        Self::unnamed(WhoKind::Other)
    }

    pub const fn all() -> Self {
        Self::unnamed(WhoKind::All)
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::named(WhoKind::User, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::named(WhoKind::Group, name)
    }

    pub fn host(name: impl Into<String>) -> Self {
        Self::named(WhoKind::Host, name)
    }

    /// The same subject with inverted polarity
    pub fn negated(mut self) -> Self {
        self.not_who = !self.not_who;
        self
    }

    pub fn who(&self) -> Option<&str> {
        self.who.as_deref()
    }

    pub fn who_kind(&self) -> WhoKind {
        self.who_kind
    }

    pub fn not_who(&self) -> bool {
        self.not_who
    }

    /// Whether this specifier applies to `requester`
    ///
    /// Host entries never match; the engine has no notion of the requesting
    /// host.
    pub fn matches(&self, requester: &dyn AccessPrincipal, is_owner: bool) -> bool {
        let name = self.who.as_deref().unwrap_or_default();

        let matched = match self.who_kind {
            WhoKind::Owner => is_owner,
            WhoKind::User => requester.account() == Some(name),
            WhoKind::Group => requester.is_member_of(name),
            WhoKind::Host => return false,
            WhoKind::Unauthenticated => requester.is_unauthenticated(),
            WhoKind::Authenticated => !requester.is_unauthenticated(),
            WhoKind::Other => !is_owner,
            WhoKind::All => true,
        };

        matched != self.not_who
    }

    pub fn encode(&self, acl: &mut EncodedAcl) {
        acl.add_char(if self.not_who { NOT_WHO_FLAG } else { WHO_FLAG });
        acl.add_char(self.who_kind.encoding());
        acl.encode_string(self.who.as_deref());
    }

    pub fn decode(acl: &mut EncodedAcl) -> AccessResult<Self> {
        let not_who = match acl.get_char()? {
            NOT_WHO_FLAG => true,
            WHO_FLAG => false,
            c => {
                acl.back();
                return Err(AccessError::malformed(
                    format!("bad who flag '{}'", c),
                    acl.error_info(),
                ));
            }
        };

        let c = acl.get_char()?;
        let Some(who_kind) = WhoKind::from_encoding(c) else {
            acl.back();
            return Err(AccessError::BadWhoType {
                kind: c,
                context: acl.error_info(),
            });
        };

        let who = acl.decode_string()?;
        if who.is_some() != who_kind.takes_name() {
            return Err(AccessError::malformed(
                format!("name presence does not match who kind '{}'", who_kind),
                acl.error_info(),
            ));
        }

        Ok(Self {
            who,
            who_kind,
            not_who,
        })
    }

    /// Display form, e.g. `NOT group staff`
    pub fn to_user_string(&self) -> String {
        let mut s = String::new();
        if self.not_who {
            s.push_str("NOT ");
        }
        s.push_str(self.who_kind.as_str());
        if let Some(name) = &self.who {
            s.push(' ');
            s.push_str(name);
        }
        s
    }
}

impl fmt::Display for AceWho {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_user_string())
    }
}
