//! Privilege hierarchy
//!
//! Privileges form a fixed tree: `all` contains `read`, `write` and `unlock`,
//! and those contain the finer grained privileges below them. Each privilege
//! is identified by a [`PrivilegeKind`] whose index selects a single
//! character encoding from a process-wide table.
//!
//! ```text
//! all (A)
//! ├── read (R)
//! │   ├── read-acl (r)
//! │   ├── read-current-user-privilege-set (P)
//! │   └── read-free-busy (F)
//! ├── write (W)
//! │   ├── write-acl (a)
//! │   ├── write-properties (p)
//! │   ├── write-content (c)
//! │   ├── bind (b)
//! │   │   └── schedule (S)
//! │   │       ├── schedule-request (t)
//! │   │       ├── schedule-reply (y)
//! │   │       └── schedule-free-busy (s)
//! │   └── unbind (u)
//! └── unlock (U)
//! ```
//!
//! In an encoded ACL a privilege is written as an allow/deny flag followed by
//! its encoding character. Containment is never written; the tree is only
//! used to match characters on decode and to expand a privilege into the
//! privileges it implies.

use crate::access::cursor::EncodedAcl;
use crate::error::{AccessError, AccessResult};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Flag preceding an allowed privilege
pub const ALLOWED_FLAG: char = 'y';

/// Flag preceding a denied privilege
pub const DENIED_FLAG: char = 'n';

/// Legacy allowed flag, accepted on decode only
pub const OLD_ALLOWED_FLAG: char = '3';

/// Legacy denied flag, accepted on decode only
pub const OLD_DENIED_FLAG: char = '2';

/// Number of privilege kinds in the encoding table
pub const PRIVILEGE_COUNT: usize = 16;

/// Encoding character for each privilege index
const PRIV_ENCODING: [char; PRIVILEGE_COUNT] = [
    'A', // all
    'R', // read
    'r', // read-acl
    'P', // read-current-user-privilege-set
    'F', // read-free-busy
    'W', // write
    'a', // write-acl
    'p', // write-properties
    'c', // write-content
    'b', // bind
    'S', // schedule
    't', // schedule-request
    'y', // schedule-reply
    's', // schedule-free-busy
    'u', // unbind
    'U', // unlock
];

/// Stable identity of a privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivilegeKind {
    All,
    Read,
    ReadAcl,
    ReadCurrentUserPrivilegeSet,
    ReadFreeBusy,
    Write,
    WriteAcl,
    WriteProperties,
    WriteContent,
    Bind,
    Schedule,
    ScheduleRequest,
    ScheduleReply,
    ScheduleFreeBusy,
    Unbind,
    Unlock,
}

impl PrivilegeKind {
    /// Ordinal of this privilege in the encoding table
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single character encoding
    pub const fn encoding(self) -> char {
        PRIV_ENCODING[self.index()]
    }

    /// Look up a kind by its ordinal
    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    /// Get the privilege name as a string
    pub const fn as_str(self) -> &'static str {
        match self {
            PrivilegeKind::All => "all",
            PrivilegeKind::Read => "read",
            PrivilegeKind::ReadAcl => "read-acl",
            PrivilegeKind::ReadCurrentUserPrivilegeSet => "read-current-user-privilege-set",
            PrivilegeKind::ReadFreeBusy => "read-free-busy",
            PrivilegeKind::Write => "write",
            PrivilegeKind::WriteAcl => "write-acl",
            PrivilegeKind::WriteProperties => "write-properties",
            PrivilegeKind::WriteContent => "write-content",
            PrivilegeKind::Bind => "bind",
            PrivilegeKind::Schedule => "schedule",
            PrivilegeKind::ScheduleRequest => "schedule-request",
            PrivilegeKind::ScheduleReply => "schedule-reply",
            PrivilegeKind::ScheduleFreeBusy => "schedule-free-busy",
            PrivilegeKind::Unbind => "unbind",
            PrivilegeKind::Unlock => "unlock",
        }
    }

    /// Try to parse a kind from its name
    pub fn try_parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }

    /// Get all kinds in index order
    pub fn all() -> &'static [PrivilegeKind] {
        &[
            PrivilegeKind::All,
            PrivilegeKind::Read,
            PrivilegeKind::ReadAcl,
            PrivilegeKind::ReadCurrentUserPrivilegeSet,
            PrivilegeKind::ReadFreeBusy,
            PrivilegeKind::Write,
            PrivilegeKind::WriteAcl,
            PrivilegeKind::WriteProperties,
            PrivilegeKind::WriteContent,
            PrivilegeKind::Bind,
            PrivilegeKind::Schedule,
            PrivilegeKind::ScheduleRequest,
            PrivilegeKind::ScheduleReply,
            PrivilegeKind::ScheduleFreeBusy,
            PrivilegeKind::Unbind,
            PrivilegeKind::Unlock,
        ]
    }
}

impl fmt::Display for PrivilegeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node in the privilege tree
///
/// Values are small and `Copy`; the contained privileges are shared by
/// reference, so a denied clone points at the same children as the
/// canonical node.
#[derive(Clone, Copy)]
pub struct Privilege {
    name: &'static str,
    description: &'static str,
    is_abstract: bool,
    is_denial: bool,
    kind: PrivilegeKind,
    contained: &'static [Privilege],
}

impl Privilege {
    /// Construct a concrete, granting privilege
    pub const fn new(
        name: &'static str,
        description: &'static str,
        kind: PrivilegeKind,
        contained: &'static [Privilege],
    ) -> Self {
        Self {
            name,
            description,
            is_abstract: false,
            is_denial: false,
            kind,
            contained,
        }
    }

    /// Construct an abstract grouping privilege
    ///
    /// Abstract privileges are never matched against an encoded character;
    /// only their children are.
    pub const fn new_abstract(
        name: &'static str,
        description: &'static str,
        kind: PrivilegeKind,
        contained: &'static [Privilege],
    ) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(name, description, kind, contained)
        }
    }

    /// Copy of this privilege with the denial flag set
    pub const fn denied(self) -> Self {
        Self {
            is_denial: true,
            ..self
        }
    }

    /// Copy of this privilege with the given polarity
    pub const fn with_denial(self, is_denial: bool) -> Self {
        Self { is_denial, ..self }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_denial(&self) -> bool {
        self.is_denial
    }

    pub fn kind(&self) -> PrivilegeKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.kind.index()
    }

    pub fn encoding(&self) -> char {
        self.kind.encoding()
    }

    /// Directly contained privileges, in declaration order
    pub fn contained(&self) -> &'static [Privilege] {
        self.contained
    }

    /// Visit this privilege and everything below it, depth first
    pub fn walk(&self, visit: &mut impl FnMut(&Privilege)) {
        visit(self);
        for child in self.contained {
            child.walk(visit);
        }
    }

    /// Whether `kind` is this privilege or one it contains
    pub fn covers(&self, kind: PrivilegeKind) -> bool {
        self.kind == kind || self.contained.iter().any(|p| p.covers(kind))
    }

    /// Depth of `kind` below this privilege (0 for this privilege itself)
    pub fn depth_of(&self, kind: PrivilegeKind) -> Option<usize> {
        if self.kind == kind {
            return Some(0);
        }
        self.contained
            .iter()
            .find_map(|p| p.depth_of(kind))
            .map(|d| d + 1)
    }

    /// Verify no two nodes of this tree share an encoding character
    pub fn check_unique_encodings(&self) -> AccessResult<()> {
        let mut seen = HashSet::new();
        let mut duplicate = None;
        self.walk(&mut |p| {
            if !seen.insert(p.encoding()) && duplicate.is_none() {
                duplicate = Some(*p);
            }
        });

        match duplicate {
            Some(p) => Err(AccessError::invalid_state(format!(
                "encoding '{}' of privilege '{}' is used more than once under '{}'",
                p.encoding(),
                p.name,
                self.name
            ))),
            None => Ok(()),
        }
    }

    /// Append the flag and encoding character for this privilege
    pub fn encode(&self, acl: &mut EncodedAcl) -> AccessResult<()> {
        if self.is_abstract {
            return Err(AccessError::invalid_state(format!(
                "abstract privilege '{}' cannot be encoded",
                self.name
            )));
        }

        acl.add_char(if self.is_denial {
            DENIED_FLAG
        } else {
            ALLOWED_FLAG
        });
        acl.add_char(self.encoding());
        Ok(())
    }

    /// Display form, e.g. `NOT write`
    pub fn to_user_string(&self) -> String {
        if self.is_denial {
            format!("NOT {}", self.name)
        } else {
            self.name.to_string()
        }
    }
}

impl PartialEq for Privilege {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.is_denial == other.is_denial
            && self.is_abstract == other.is_abstract
    }
}

impl Eq for Privilege {}

impl Hash for Privilege {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.is_denial.hash(state);
        self.is_abstract.hash(state);
    }
}

impl fmt::Debug for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Privilege")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("abstract", &self.is_abstract)
            .field("denial", &self.is_denial)
            .field(
                "contains",
                &self.contained.iter().map(|p| p.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_user_string())
    }
}

/// Produce a denial of `val` sharing its containment
pub fn clone_denied(val: &Privilege) -> Privilege {
    val.denied()
}

/// Decode one privilege from `acl`
///
/// Returns `Ok(None)` when the input holds no further privilege. In that
/// case the cursor is left exactly where it was, so the caller can go on to
/// parse whatever follows the privilege list.
pub fn find_privilege(
    allowed_root: &Privilege,
    denied_root: &Privilege,
    acl: &mut EncodedAcl,
) -> AccessResult<Option<Privilege>> {
    match acl.remaining() {
        0 => return Ok(None),
        1 => {
            // A flag with nothing after it cannot be the end of a valid list
            if acl.peek().is_some_and(is_privilege_flag) {
                return Err(AccessError::Truncated {
                    context: acl.error_info(),
                });
            }
            return Ok(None);
        }
        _ => {}
    }

    let denied = match_denied(acl)?;
    let root = if denied { denied_root } else { allowed_root };

    match match_encoding(root, acl)? {
        Some(p) => Ok(Some(p.with_denial(denied))),
        None => {
            acl.back(); // back up over the flag
            Ok(None)
        }
    }
}

/// Whether `c` is an allow or deny flag, current or legacy
pub fn is_privilege_flag(c: char) -> bool {
    matches!(
        c,
        ALLOWED_FLAG | DENIED_FLAG | OLD_ALLOWED_FLAG | OLD_DENIED_FLAG
    )
}

fn match_denied(acl: &mut EncodedAcl) -> AccessResult<bool> {
    let c = acl.get_char()?;

    match c {
        DENIED_FLAG | OLD_DENIED_FLAG => Ok(true),
        ALLOWED_FLAG | OLD_ALLOWED_FLAG => Ok(false),
        _ => {
            acl.back();
            Err(AccessError::BadPrivilegeFlag {
                flag: c,
                context: acl.error_info(),
            })
        }
    }
}

/// Search the tree under `node` for the encoding at the cursor
///
/// Consumes the character only on a match.
fn match_encoding<'a>(node: &'a Privilege, acl: &mut EncodedAcl) -> AccessResult<Option<&'a Privilege>> {
    if acl.remaining() < 1 {
        return Ok(None);
    }

    if !node.is_abstract {
        if acl.get_char()? == node.encoding() {
            return Ok(Some(node));
        }
        acl.back();
    }

    for child in node.contained {
        if let Some(p) = match_encoding(child, acl)? {
            return Ok(Some(p));
        }
    }

    Ok(None)
}

const READ_ACL: Privilege = Privilege::new(
    "read-acl",
    "Read the access control list",
    PrivilegeKind::ReadAcl,
    &[],
);

const READ_CURRENT_USER_PRIVILEGE_SET: Privilege = Privilege::new(
    "read-current-user-privilege-set",
    "Read the privileges granted to the current user",
    PrivilegeKind::ReadCurrentUserPrivilegeSet,
    &[],
);

const READ_FREE_BUSY: Privilege = Privilege::new(
    "read-free-busy",
    "Read free/busy information",
    PrivilegeKind::ReadFreeBusy,
    &[],
);

const WRITE_ACL: Privilege = Privilege::new(
    "write-acl",
    "Change the access control list",
    PrivilegeKind::WriteAcl,
    &[],
);

const WRITE_PROPERTIES: Privilege = Privilege::new(
    "write-properties",
    "Change properties",
    PrivilegeKind::WriteProperties,
    &[],
);

const SCHEDULE_REQUEST: Privilege = Privilege::new(
    "schedule-request",
    "Submit scheduling requests",
    PrivilegeKind::ScheduleRequest,
    &[],
);

const SCHEDULE_REPLY: Privilege = Privilege::new(
    "schedule-reply",
    "Reply to scheduling requests",
    PrivilegeKind::ScheduleReply,
    &[],
);

const SCHEDULE_FREE_BUSY: Privilege = Privilege::new(
    "schedule-free-busy",
    "Submit free/busy requests",
    PrivilegeKind::ScheduleFreeBusy,
    &[],
);

const SCHEDULE: Privilege = Privilege::new(
    "schedule",
    "Scheduling operations",
    PrivilegeKind::Schedule,
    &[SCHEDULE_REQUEST, SCHEDULE_REPLY, SCHEDULE_FREE_BUSY],
);

const BIND: Privilege = Privilege::new(
    "bind",
    "Add a member to a collection",
    PrivilegeKind::Bind,
    &[SCHEDULE],
);

const UNBIND: Privilege = Privilege::new(
    "unbind",
    "Remove a member from a collection",
    PrivilegeKind::Unbind,
    &[],
);

/// Change the content of an object
pub const WRITE_CONTENT: Privilege = Privilege::new(
    "write-content",
    "Change the content of an object",
    PrivilegeKind::WriteContent,
    &[],
);

/// Read access to an object
pub const READ: Privilege = Privilege::new(
    "read",
    "Read any object",
    PrivilegeKind::Read,
    &[READ_ACL, READ_CURRENT_USER_PRIVILEGE_SET, READ_FREE_BUSY],
);

/// Write access to an object
pub const WRITE: Privilege = Privilege::new(
    "write",
    "Write any object",
    PrivilegeKind::Write,
    &[WRITE_ACL, WRITE_PROPERTIES, WRITE_CONTENT, BIND, UNBIND],
);

const UNLOCK: Privilege = Privilege::new("unlock", "Remove a lock", PrivilegeKind::Unlock, &[]);

/// Full access to an object; root of the tree
pub const ALL: Privilege = Privilege::new(
    "all",
    "All privileges",
    PrivilegeKind::All,
    &[READ, WRITE, UNLOCK],
);

/// No access; the denied root used for decoding
pub const NONE: Privilege = ALL.denied();

/// Canonical privileges in index order
static STANDARD: [Privilege; PRIVILEGE_COUNT] = [
    ALL,
    READ,
    READ_ACL,
    READ_CURRENT_USER_PRIVILEGE_SET,
    READ_FREE_BUSY,
    WRITE,
    WRITE_ACL,
    WRITE_PROPERTIES,
    WRITE_CONTENT,
    BIND,
    SCHEDULE,
    SCHEDULE_REQUEST,
    SCHEDULE_REPLY,
    SCHEDULE_FREE_BUSY,
    UNBIND,
    UNLOCK,
];

/// The canonical granting privilege for `kind`
pub fn privilege(kind: PrivilegeKind) -> Privilege {
    STANDARD[kind.index()]
}

/// The canonical granting privilege at `index`
pub fn make_priv(index: usize) -> AccessResult<Privilege> {
    PrivilegeKind::from_index(index)
        .map(privilege)
        .ok_or_else(|| {
            AccessError::invalid_state(format!(
                "privilege index {} is outside 0..{}",
                index, PRIVILEGE_COUNT
            ))
        })
}
