//! ACL decision engine
//!
//! Decides whether a principal may exercise a set of privileges against an
//! entity, given the entity's ACL in a compact text encoding.
//!
//! ## Features
//!
//! - **Compact encoding** with single character tags and length prefixed names
//! - **Privilege tree** where granting `write` grants everything it contains
//! - **Deterministic precedence** from owner down to authenticated users
//! - **Filters** that cap what an evaluation may grant
//!
//! ## Evaluation Order
//!
//! ```text
//! unauthenticated → owner → user → groups (merged) → other → authenticated → none
//! ```
//!
//! ## Example
//!
//! ```
//! use acl_engine::access::{Access, Principal, default_public_access};
//!
//! let acl = default_public_access().unwrap();
//! let owner = Principal::user("alice");
//! let guest = Principal::unauthenticated();
//!
//! let ca = Access::new(false).check_read(&guest, &owner, acl, None).unwrap();
//! assert!(ca.access_allowed());
//!
//! let ca = Access::new(false).check_read_write(&guest, &owner, acl, None).unwrap();
//! assert!(!ca.access_allowed());
//! ```

pub mod access;
pub mod config;
pub mod error;

// Re-export main types
pub use access::{Access, Acl, CurrentAccess};
pub use config::{AppConfig, load_config};
pub use error::{AccessError, AccessResult, AppError, Result};
