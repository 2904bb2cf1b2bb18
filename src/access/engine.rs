//! Decision facade and default ACLs
//!
//! [`Access`] picks a desired privilege set and delegates to
//! [`Acl::evaluate_access`]. A fresh [`Acl`] is built for every call.
//!
//! The two canonical default encodings are built once by
//! [`init_defaults`]; failure is returned to the caller.

use crate::access::ace::Ace;
use crate::access::acl::{Acl, CurrentAccess};
use crate::access::principal::AccessPrincipal;
use crate::access::privilege::{self, ALL, NONE, Privilege, READ, WRITE};
use crate::access::privilege_set::PrivilegeSet;
use crate::access::who::AceWho;
use crate::error::AccessResult;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Any access at all
pub const PRIV_SET_ANY: &[Privilege] = &[];

pub const PRIV_SET_READ: &[Privilege] = &[READ];

pub const PRIV_SET_READ_WRITE: &[Privilege] = &[READ, WRITE];

/// Entry point for access checks
#[derive(Debug, Clone, Copy, Default)]
pub struct Access {
    debug: bool,
}

impl Access {
    /// Create a facade; `debug` logs every decoded ACL
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Evaluate `how` against an encoded ACL
    pub fn evaluate_access(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        how: &[Privilege],
        acl: &str,
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        let chars: Vec<char> = acl.chars().collect();
        self.evaluate_access_chars(who, owner, how, &chars, filter)
    }

    /// Evaluate `how` against an ACL already split into characters
    pub fn evaluate_access_chars(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        how: &[Privilege],
        acl: &[char],
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        Acl::new(self.debug).evaluate_access(who, owner, how, acl, filter)
    }

    pub fn check_read(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        acl: &str,
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        self.evaluate_access(who, owner, PRIV_SET_READ, acl, filter)
    }

    pub fn check_read_write(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        acl: &str,
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        self.evaluate_access(who, owner, PRIV_SET_READ_WRITE, acl, filter)
    }

    /// Allowed if any privilege at all is granted
    pub fn check_any(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        acl: &str,
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        self.evaluate_access(who, owner, PRIV_SET_ANY, acl, filter)
    }

    /// Evaluate a single privilege given by index
    pub fn evaluate_privilege(
        &self,
        who: &dyn AccessPrincipal,
        owner: &dyn AccessPrincipal,
        index: usize,
        acl: &str,
        filter: Option<&PrivilegeSet>,
    ) -> AccessResult<CurrentAccess> {
        let p = Self::make_priv(index)?;
        self.evaluate_access(who, owner, &[p], acl, filter)
    }

    /// Privilege for `index`, `InvalidState` if there is none
    pub fn make_priv(index: usize) -> AccessResult<Privilege> {
        privilege::make_priv(index)
    }
}

/// The canonical default ACL encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAcls {
    /// Owner full access, everyone else read
    pub public: String,
    /// Owner full access, nothing for anyone else
    pub personal: String,
}

impl DefaultAcls {
    pub fn build() -> AccessResult<Self> {
        let mut public = Acl::default();
        public.add_ace(Ace::new(AceWho::owner(), vec![ALL], None));
        public.add_ace(Ace::new(AceWho::other(), vec![READ], None));
        public.add_ace(Ace::new(AceWho::unauthenticated(), vec![READ], None));

        let mut personal = Acl::default();
        personal.add_ace(Ace::new(AceWho::owner(), vec![ALL], None));
        personal.add_ace(Ace::new(AceWho::other(), vec![NONE], None));

        Ok(Self {
            public: public.encode()?,
            personal: personal.encode()?,
        })
    }
}

/// Validate the privilege hierarchy and build the default encodings
pub fn build_defaults() -> AccessResult<DefaultAcls> {
    PrivilegeSet::standard().validate()?;
    let defaults = DefaultAcls::build()?;
    debug!(public = %defaults.public, personal = %defaults.personal, "Built default ACLs");
    Ok(defaults)
}

static DEFAULTS: OnceLock<DefaultAcls> = OnceLock::new();

/// Build the defaults once for the process
///
/// Later calls return the stored value.
pub fn init_defaults() -> AccessResult<&'static DefaultAcls> {
    if let Some(defaults) = DEFAULTS.get() {
        return Ok(defaults);
    }
    let defaults = build_defaults()?;
    info!("Default ACLs initialized");
    Ok(DEFAULTS.get_or_init(|| defaults))
}

/// Default ACL for entities readable by everyone
pub fn default_public_access() -> AccessResult<&'static str> {
    init_defaults().map(|d| d.public.as_str())
}

/// Default ACL for entities private to their owner
pub fn default_personal_access() -> AccessResult<&'static str> {
    init_defaults().map(|d| d.personal.as_str())
}
