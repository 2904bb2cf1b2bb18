//! Access control module
//!
//! Encoded ACLs are decoded and evaluated in layers:
//!
//! ```text
//! engine (Access facade)
//!   └── acl (evaluation, precedence)
//!         └── ace (entry codec)
//!               ├── who (subject codec)
//!               └── privilege_set / privilege (tree matching)
//!                     └── cursor (character stream)
//! ```
//!
//! The privilege hierarchy and the standard privilege set are immutable
//! statics shared by every evaluation. ACL values are built per call.

pub mod ace;
pub mod acl;
pub mod cursor;
pub mod engine;
pub mod principal;
pub mod privilege;
pub mod privilege_set;
pub mod who;

pub use ace::Ace;
pub use acl::{Acl, CurrentAccess, DecisionRule};
pub use cursor::EncodedAcl;
pub use engine::{
    Access, DefaultAcls, PRIV_SET_ANY, PRIV_SET_READ, PRIV_SET_READ_WRITE, build_defaults,
    default_personal_access, default_public_access, init_defaults,
};
pub use principal::{AccessPrincipal, Directory, Principal};
pub use privilege::{Privilege, PrivilegeKind};
pub use privilege_set::{PrivilegeSet, PrivilegeStates, Verdict};
pub use who::{AceWho, WhoKind};
