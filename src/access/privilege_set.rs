//! Privilege sets and per-privilege verdicts
//!
//! A [`PrivilegeSet`] is an ordered list of privilege tree roots. It serves
//! as the dictionary privileges are decoded against and, when passed as a
//! filter, as the ceiling on what an evaluation may grant.
//!
//! [`PrivilegeStates`] records an allow/deny verdict for every privilege
//! index. ACE privilege lists are expanded into states before evaluation
//! so entries can be merged index by index.

use crate::access::cursor::EncodedAcl;
use crate::access::privilege::{
    self, ALL, PRIVILEGE_COUNT, Privilege, PrivilegeKind, find_privilege,
};
use crate::error::{AccessError, AccessResult};
use serde::Serialize;
use std::borrow::Cow;

/// Verdict for a single privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No entry said anything about this privilege
    #[default]
    Unspecified,
    Allowed,
    Denied,
}

impl Verdict {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    pub const fn is_specified(&self) -> bool {
        !matches!(self, Verdict::Unspecified)
    }
}

/// Allow/deny verdict for every privilege index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrivilegeStates {
    states: [Verdict; PRIVILEGE_COUNT],
}

impl PrivilegeStates {
    /// Nothing specified
    pub fn unspecified() -> Self {
        Self::default()
    }

    /// Every privilege allowed
    pub fn all_allowed() -> Self {
        Self {
            states: [Verdict::Allowed; PRIVILEGE_COUNT],
        }
    }

    /// Every privilege denied
    pub fn all_denied() -> Self {
        Self {
            states: [Verdict::Denied; PRIVILEGE_COUNT],
        }
    }

    /// Expand a privilege list into states
    ///
    /// Privileges are applied from the top of the tree down, so a specific
    /// privilege always overrides the more general one containing it.
    /// Entries at the same depth apply in list order.
    pub fn from_privileges(privileges: &[Privilege]) -> Self {
        let mut ordered: Vec<&Privilege> = privileges.iter().collect();
        ordered.sort_by_key(|p| ALL.depth_of(p.kind()).unwrap_or(0));

        let mut states = Self::unspecified();
        for p in ordered {
            states.set_privilege(p);
        }
        states
    }

    /// Set `privilege` and everything it contains to its polarity
    pub fn set_privilege(&mut self, privilege: &Privilege) {
        let verdict = if privilege.is_denial() {
            Verdict::Denied
        } else {
            Verdict::Allowed
        };
        privilege.walk(&mut |p| self.states[p.index()] = verdict);
    }

    pub fn get(&self, kind: PrivilegeKind) -> Verdict {
        self.states[kind.index()]
    }

    pub fn is_allowed(&self, kind: PrivilegeKind) -> bool {
        self.get(kind).is_allowed()
    }

    /// Whether any privilege at all is allowed
    pub fn any_allowed(&self) -> bool {
        self.states.iter().any(Verdict::is_allowed)
    }

    /// Combine with `other`, the more permissive verdict winning per index
    pub fn merge_permissive(&mut self, other: &PrivilegeStates) {
        for (mine, theirs) in self.states.iter_mut().zip(other.states.iter()) {
            *mine = match (*mine, *theirs) {
                (Verdict::Allowed, _) | (_, Verdict::Allowed) => Verdict::Allowed,
                (Verdict::Denied, _) | (_, Verdict::Denied) => Verdict::Denied,
                _ => Verdict::Unspecified,
            };
        }
    }

    /// Force every privilege the ceiling does not allow to denied
    pub fn restrict_to(&mut self, ceiling: &PrivilegeStates) {
        for (state, cap) in self.states.iter_mut().zip(ceiling.states.iter()) {
            if !cap.is_allowed() {
                *state = Verdict::Denied;
            }
        }
    }

    /// `(kind, verdict)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (PrivilegeKind, Verdict)> + '_ {
        PrivilegeKind::all()
            .iter()
            .map(|kind| (*kind, self.get(*kind)))
    }

    /// Shortest privilege list that expands back into these states
    pub fn to_privileges(&self) -> Vec<Privilege> {
        let mut out = Vec::new();
        self.collect_privileges(&ALL, Verdict::Unspecified, &mut out);
        out
    }

    fn collect_privileges(&self, node: &Privilege, inherited: Verdict, out: &mut Vec<Privilege>) {
        let verdict = self.get(node.kind());
        if verdict.is_specified() && verdict != inherited {
            out.push(privilege::privilege(node.kind()).with_denial(verdict == Verdict::Denied));
        }

        let passed_down = if verdict.is_specified() {
            verdict
        } else {
            inherited
        };
        for child in node.contained() {
            self.collect_privileges(child, passed_down, out);
        }
    }
}

/// Ordered collection of privilege tree roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeSet {
    privileges: Cow<'static, [Privilege]>,
}

static STANDARD_SET: PrivilegeSet = PrivilegeSet {
    privileges: Cow::Borrowed(&[ALL]),
};

impl PrivilegeSet {
    /// Create a set from the given roots
    pub fn new(privileges: Vec<Privilege>) -> Self {
        Self {
            privileges: Cow::Owned(privileges),
        }
    }

    /// The full tree rooted at `all`, decoded against the `all`/`none` pair
    pub fn standard() -> &'static PrivilegeSet {
        &STANDARD_SET
    }

    /// Create a set from privilege kinds
    pub fn from_kinds(kinds: &[PrivilegeKind]) -> Self {
        Self::new(kinds.iter().map(|k| privilege::privilege(*k)).collect())
    }

    /// Create a set from raw privilege indices
    pub fn from_indices(indices: &[usize]) -> AccessResult<Self> {
        let privileges = indices
            .iter()
            .map(|i| privilege::make_priv(*i))
            .collect::<AccessResult<Vec<_>>>()?;
        Ok(Self::new(privileges))
    }

    pub fn privileges(&self) -> &[Privilege] {
        &self.privileges
    }

    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty()
    }

    /// States granting exactly what this set covers
    pub fn ceiling(&self) -> PrivilegeStates {
        PrivilegeStates::from_privileges(&self.privileges)
    }

    /// Whether this set, used as a ceiling, permits `kind`
    pub fn permits(&self, kind: PrivilegeKind) -> bool {
        self.ceiling().is_allowed(kind)
    }

    /// Decode one privilege, trying each root in order
    ///
    /// Each root is searched with its denied clone as the denied root.
    pub fn find_privilege(&self, acl: &mut EncodedAcl) -> AccessResult<Option<Privilege>> {
        for root in self.privileges.iter() {
            if let Some(p) = find_privilege(root, &root.denied(), acl)? {
                return Ok(Some(p));
            }
        }
        Ok(None)
    }

    /// Check every root for duplicate encodings
    pub fn validate(&self) -> AccessResult<()> {
        if self.privileges.is_empty() {
            return Err(AccessError::invalid_state("privilege set has no roots"));
        }
        self.privileges
            .iter()
            .try_for_each(Privilege::check_unique_encodings)
    }
}

impl Default for PrivilegeSet {
    fn default() -> Self {
        Self::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::privilege::{NONE, READ, WRITE, WRITE_CONTENT};

    #[test]
    fn test_from_privileges_expands_subtree() {
        let states = PrivilegeStates::from_privileges(&[READ]);
        assert!(states.is_allowed(PrivilegeKind::Read));
        assert!(states.is_allowed(PrivilegeKind::ReadFreeBusy));
        assert_eq!(states.get(PrivilegeKind::Write), Verdict::Unspecified);
    }

    #[test]
    fn test_specific_overrides_general_in_any_order() {
        let a = PrivilegeStates::from_privileges(&[ALL, WRITE.denied()]);
        let b = PrivilegeStates::from_privileges(&[WRITE.denied(), ALL]);
        assert_eq!(a, b);
        assert!(a.is_allowed(PrivilegeKind::Read));
        assert_eq!(a.get(PrivilegeKind::WriteContent), Verdict::Denied);
        assert!(a.is_allowed(PrivilegeKind::Unlock));
    }

    #[test]
    fn test_none_denies_everything() {
        let states = PrivilegeStates::from_privileges(&[NONE]);
        assert_eq!(states, PrivilegeStates::all_denied());
        assert!(!states.any_allowed());
    }

    #[test]
    fn test_merge_permissive() {
        let mut a = PrivilegeStates::from_privileges(&[WRITE, READ.denied()]);
        let b = PrivilegeStates::from_privileges(&[READ, WRITE.denied()]);
        a.merge_permissive(&b);
        assert!(a.is_allowed(PrivilegeKind::Read));
        assert!(a.is_allowed(PrivilegeKind::Write));
        assert_eq!(a.get(PrivilegeKind::Unlock), Verdict::Unspecified);
    }

    #[test]
    fn test_merge_keeps_denial_without_allow() {
        let mut a = PrivilegeStates::from_privileges(&[WRITE.denied()]);
        a.merge_permissive(&PrivilegeStates::unspecified());
        assert_eq!(a.get(PrivilegeKind::Write), Verdict::Denied);
    }

    #[test]
    fn test_restrict_to_ceiling() {
        let mut states = PrivilegeStates::all_allowed();
        states.restrict_to(&PrivilegeSet::from_kinds(&[PrivilegeKind::Read]).ceiling());
        assert!(states.is_allowed(PrivilegeKind::Read));
        assert!(states.is_allowed(PrivilegeKind::ReadAcl));
        assert_eq!(states.get(PrivilegeKind::Write), Verdict::Denied);
        assert_eq!(states.get(PrivilegeKind::All), Verdict::Denied);
    }

    #[test]
    fn test_to_privileges_is_minimal() {
        let states = PrivilegeStates::from_privileges(&[ALL, WRITE_CONTENT.denied()]);
        assert_eq!(states.to_privileges(), vec![ALL, WRITE_CONTENT.denied()]);
        assert_eq!(PrivilegeStates::from_privileges(&states.to_privileges()), states);
    }

    #[test]
    fn test_from_indices() {
        let set = PrivilegeSet::from_indices(&[1, 5]).unwrap();
        assert_eq!(set.privileges(), &[READ, WRITE]);

        let err = PrivilegeSet::from_indices(&[1, 42]).unwrap_err();
        assert!(matches!(err, AccessError::InvalidState(_)));
    }

    #[test]
    fn test_permits() {
        let set = PrivilegeSet::from_kinds(&[PrivilegeKind::Write]);
        assert!(set.permits(PrivilegeKind::Bind));
        assert!(!set.permits(PrivilegeKind::Read));
    }

    #[test]
    fn test_standard_set_decodes() {
        let mut acl = EncodedAcl::from("nAyR");
        let set = PrivilegeSet::standard();
        assert_eq!(set.find_privilege(&mut acl).unwrap(), Some(NONE));
        assert_eq!(set.find_privilege(&mut acl).unwrap(), Some(READ));
        assert_eq!(set.find_privilege(&mut acl).unwrap(), None);
        set.validate().unwrap();
    }

    #[test]
    fn test_multiple_roots_tried_in_order() {
        let set = PrivilegeSet::from_kinds(&[PrivilegeKind::Read, PrivilegeKind::Write]);
        let mut acl = EncodedAcl::from("yc");
        assert_eq!(set.find_privilege(&mut acl).unwrap(), Some(WRITE_CONTENT));

        let mut acl = EncodedAcl::from("yU");
        assert_eq!(set.find_privilege(&mut acl).unwrap(), None);
        assert_eq!(acl.position(), 0);
    }
}
