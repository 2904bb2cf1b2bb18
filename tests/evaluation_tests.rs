//! Access evaluation integration tests
//!
//! Evaluation order:
//! - Unauthenticated requesters only ever see the unauthenticated entry
//! - The owner gets the owner entry, or everything when there is none
//! - A user entry for the requester beats any group entry
//! - Matching group entries are merged, most permissive verdict per privilege
//! - Other beats authenticated
//! - Nothing applies means nothing is granted
//!
//! Filters cap the outcome of every rule, including the owner default.

use acl_engine::access::privilege::{self, ALL, READ, WRITE};
use acl_engine::access::{
    Access, DecisionRule, Directory, PRIV_SET_ANY, PRIV_SET_READ, PRIV_SET_READ_WRITE, Principal,
    Privilege, PrivilegeKind, PrivilegeSet, Verdict, default_personal_access,
    default_public_access,
};
use acl_engine::config::load_config_from_str;
use acl_engine::error::AccessError;
use rstest::rstest;

// =============================================================================
// Test Helpers
// =============================================================================

fn engine() -> Access {
    Access::new(false)
}

fn owner() -> Principal {
    Principal::user("owner")
}

fn bob() -> Principal {
    Principal::user("bob").with_groups(["staff"])
}

fn read_filter() -> PrivilegeSet {
    PrivilegeSet::from_kinds(&[PrivilegeKind::Read])
}

// =============================================================================
// 1. Owner
// =============================================================================

mod owner_rules {
    use super::*;

    #[rstest]
    #[case::any(PRIV_SET_ANY)]
    #[case::read(PRIV_SET_READ)]
    #[case::read_write(PRIV_SET_READ_WRITE)]
    #[case::all(&[ALL])]
    #[case::unlock(&[privilege::privilege(PrivilegeKind::Unlock)])]
    fn test_owner_default_allows_everything(#[case] how: &[Privilege]) {
        for acl in ["", "WZNnA ", "WANnA WXNnA ", "WG05 staffnA WU05 ownernA "] {
            let ca = engine()
                .evaluate_access(&owner(), &owner(), how, acl, None)
                .unwrap();
            assert!(ca.access_allowed(), "acl {:?}", acl);
            assert_eq!(ca.rule(), DecisionRule::OwnerDefault);
        }
    }

    #[test]
    fn test_owner_default_for_every_privilege() {
        for index in 0..PrivilegeKind::all().len() {
            let ca = engine()
                .evaluate_privilege(&owner(), &owner(), index, "WZNnA ", None)
                .unwrap();
            assert!(ca.access_allowed(), "privilege index {}", index);
        }
    }

    #[test]
    fn test_owner_entry_restricts_owner() {
        let ca = engine()
            .check_read_write(&owner(), &owner(), "WONyR WZNyA ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert_eq!(ca.rule(), DecisionRule::Owner);
    }

    #[test]
    fn test_owner_beats_user_entry() {
        let ca = engine()
            .check_read_write(&owner(), &owner(), "WU05 ownernA WONyA ", None)
            .unwrap();
        assert!(ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Owner);
    }

    #[test]
    fn test_owner_default_is_still_filtered() {
        let ca = engine()
            .check_read_write(&owner(), &owner(), "", Some(&read_filter()))
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert!(!ca.is_allowed(PrivilegeKind::Write));
    }

    #[test]
    fn test_owner_entry_does_not_apply_to_others() {
        let ca = engine()
            .check_any(&bob(), &owner(), "WONyA ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Default);
    }
}

// =============================================================================
// 2. Users and groups
// =============================================================================

mod user_and_group_rules {
    use super::*;

    #[test]
    fn test_user_entry_beats_groups() {
        let ca = engine()
            .check_read_write(&bob(), &owner(), "WG05 staffyA WU03 bobyR ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert_eq!(ca.rule(), DecisionRule::User);
        assert_eq!(ca.ace().unwrap().who().who(), Some("bob"));
    }

    #[test]
    fn test_user_entry_for_someone_else_ignored() {
        let ca = engine()
            .check_read(&bob(), &owner(), "WU05 aliceyA WZNnA ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Other);
    }

    #[test]
    fn test_negated_user_entry_applies_to_everyone_else() {
        let ca = engine()
            .check_read(&bob(), &owner(), "NU05 aliceyR ", None)
            .unwrap();
        assert!(ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::User);
    }

    #[test]
    fn test_group_merge_is_permissive() {
        let bob = bob().with_groups(["editors"]);
        let ca = engine()
            .check_read_write(
                &bob,
                &owner(),
                "WG05 staffyWnR WG07 editorsyRnW ",
                None,
            )
            .unwrap();
        assert!(ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert!(ca.is_allowed(PrivilegeKind::Write));
        assert_eq!(ca.rule(), DecisionRule::Group);
    }

    #[test]
    fn test_repeated_group_entries_merge() {
        let ca = engine()
            .check_read_write(
                &bob(),
                &owner(),
                "WONyA WG05 staffyWnR WG05 staffyR ",
                None,
            )
            .unwrap();
        assert!(ca.access_allowed());

        let ace = ca.ace().unwrap();
        assert_eq!(ace.who().who(), Some("staff, staff"));
        assert_eq!(ace.privileges(), &[READ, WRITE]);
    }

    #[test]
    fn test_merge_keeps_unrelated_denials() {
        let bob = bob().with_groups(["editors"]);
        let ca = engine()
            .evaluate_access(
                &bob,
                &owner(),
                &[WRITE],
                "WG05 staffyRnc WG07 editorsyp ",
                None,
            )
            .unwrap();
        let states = ca.privileges();
        assert_eq!(states.get(PrivilegeKind::WriteContent), Verdict::Denied);
        assert_eq!(states.get(PrivilegeKind::WriteProperties), Verdict::Allowed);
        assert!(!ca.access_allowed());
    }

    #[test]
    fn test_single_group_match_reports_that_entry() {
        let ca = engine()
            .check_read(&bob(), &owner(), "WG06 adminsyA WG05 staffyR ", None)
            .unwrap();
        let ace = ca.ace().unwrap();
        assert_eq!(ace.who().who(), Some("staff"));
        assert!(!ace.is_inherited());
    }

    #[test]
    fn test_non_member_group_never_participates() {
        let ca = engine()
            .check_read_write(&bob(), &owner(), "WG06 adminsyA WG05 staffyR ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert!(!ca.is_allowed(PrivilegeKind::Write));

        let ca = engine()
            .check_read_write(&bob(), &owner(), "WG06 adminsyA WZNyR ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Other);
    }

    #[test]
    fn test_group_match_is_final() {
        let ca = engine()
            .check_read(&bob(), &owner(), "WG05 staffnA WZNyA WANyA ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Group);
    }
}

// =============================================================================
// 3. Other, authenticated and unauthenticated
// =============================================================================

mod fallback_rules {
    use super::*;

    #[test]
    fn test_other_beats_authenticated() {
        let ca = engine()
            .check_read_write(&bob(), &owner(), "WANyA WZNyR ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert_eq!(ca.rule(), DecisionRule::Other);
    }

    #[test]
    fn test_authenticated_when_no_other() {
        let ca = engine()
            .check_read(&bob(), &owner(), "WONyA WANyR ", None)
            .unwrap();
        assert!(ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Authenticated);
    }

    #[test]
    fn test_unauthenticated_public_read() {
        let ca = engine()
            .check_read(
                &Principal::unauthenticated(),
                &owner(),
                "WONyA WZNyR WXNyR ",
                None,
            )
            .unwrap();
        assert!(ca.access_allowed());
        assert!(!ca.is_allowed(PrivilegeKind::Write));
        assert_eq!(ca.rule(), DecisionRule::Unauthenticated);
    }

    #[test]
    fn test_unauthenticated_ignores_other_entries() {
        let ca = engine()
            .check_any(&Principal::unauthenticated(), &owner(), "WZNyA WANyA WLNyA ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Default);
    }

    #[test]
    fn test_host_and_all_entries_take_no_part() {
        let ca = engine()
            .check_read_write(&bob(), &owner(), "WH03 bobyA WLNyA WZNyR ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Other);
    }

    #[test]
    fn test_no_entry_denies() {
        let ca = engine()
            .check_any(&bob(), &owner(), "WONyA ", None)
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.ace().is_none());
    }

    #[test]
    fn test_inherited_entry_evaluates_normally() {
        let ca = engine()
            .check_read(&bob(), &owner(), "WZNyRI05 /user ", None)
            .unwrap();
        assert!(ca.access_allowed());
        assert_eq!(ca.ace().unwrap().inherited_from(), Some("/user"));
    }
}

// =============================================================================
// 4. Desired privileges and filters
// =============================================================================

mod desired_and_filters {
    use super::*;

    #[test]
    fn test_filter_caps_all() {
        let ca = engine()
            .check_read_write(&bob(), &owner(), "WZNyA ", Some(&read_filter()))
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
        assert!(ca.is_allowed(PrivilegeKind::ReadFreeBusy));
        assert!(!ca.is_allowed(PrivilegeKind::Write));
        assert!(!ca.is_allowed(PrivilegeKind::All));
    }

    #[test]
    fn test_filter_never_grants() {
        let filter = PrivilegeSet::from_kinds(&[PrivilegeKind::All]);
        let ca = engine()
            .check_read_write(&bob(), &owner(), "WZNyR ", Some(&filter))
            .unwrap();
        assert!(!ca.access_allowed());
        assert!(ca.is_allowed(PrivilegeKind::Read));
    }

    #[test]
    fn test_filter_from_indices() {
        let filter = PrivilegeSet::from_indices(&[5]).unwrap();
        let ca = engine()
            .evaluate_privilege(&bob(), &owner(), 8, "WZNyA ", Some(&filter))
            .unwrap();
        assert!(ca.access_allowed());
        assert!(!ca.is_allowed(PrivilegeKind::Read));
    }

    #[test]
    fn test_filter_with_unknown_index_is_invalid_state() {
        let err = PrivilegeSet::from_indices(&[1, 16]).unwrap_err();
        assert!(matches!(err, AccessError::InvalidState(_)));
    }

    #[test]
    fn test_any_allowed_with_single_fine_privilege() {
        let ca = engine()
            .check_any(&bob(), &owner(), "WZNyF ", None)
            .unwrap();
        assert!(ca.access_allowed());
        assert!(!ca.is_allowed(PrivilegeKind::Read));
    }

    #[test]
    fn test_specific_denial_overrides_general_grant() {
        let acl = "WZNncyA ";
        let ca = engine()
            .evaluate_privilege(&bob(), &owner(), 8, acl, None)
            .unwrap();
        assert!(!ca.access_allowed());

        let ca = engine()
            .evaluate_privilege(&bob(), &owner(), 6, acl, None)
            .unwrap();
        assert!(ca.access_allowed());
    }

    #[test]
    fn test_desired_polarity_ignored() {
        let ca = engine()
            .evaluate_access(&bob(), &owner(), &[WRITE.denied()], "WZNyW ", None)
            .unwrap();
        assert!(ca.access_allowed());
        assert_eq!(ca.desired()[0].kind(), PrivilegeKind::Write);
    }

    #[test]
    fn test_char_input() {
        let chars: Vec<char> = "WZNyR ".chars().collect();
        let ca = engine()
            .evaluate_access_chars(&bob(), &owner(), PRIV_SET_READ, &chars, None)
            .unwrap();
        assert!(ca.access_allowed());
    }
}

// =============================================================================
// 5. Failures and defaults
// =============================================================================

mod failures_and_defaults {
    use super::*;

    #[rstest]
    #[case::bad_who_type("WONyA WQN ")]
    #[case::bad_who_type_at_start("WQNyA ")]
    fn test_bad_who_type_yields_no_decision(#[case] acl: &str) {
        let err = engine()
            .check_read(&owner(), &owner(), acl, None)
            .unwrap_err();
        assert!(matches!(err, AccessError::BadWhoType { kind: 'Q', .. }));
    }

    #[test]
    fn test_corrupt_acl_is_error_even_for_owner() {
        let err = engine()
            .check_any(&owner(), &owner(), "WONyA WU03 bo", None)
            .unwrap_err();
        assert!(matches!(err, AccessError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_privilege_index() {
        let err = engine()
            .evaluate_privilege(&bob(), &owner(), 42, "WZNyA ", None)
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidState(_)));
        assert!(Access::make_priv(42).is_err());
    }

    #[test]
    fn test_public_default() {
        let acl = default_public_access().unwrap();
        assert_eq!(acl, "WONyA WZNyR WXNyR ");

        let ca = engine().check_read(&bob(), &owner(), acl, None).unwrap();
        assert!(ca.access_allowed());
        let ca = engine().check_read_write(&bob(), &owner(), acl, None).unwrap();
        assert!(!ca.access_allowed());
    }

    #[test]
    fn test_personal_default() {
        let acl = default_personal_access().unwrap();
        assert_eq!(acl, "WONyA WZNnA ");

        let ca = engine().check_any(&bob(), &owner(), acl, None).unwrap();
        assert!(!ca.access_allowed());
        let ca = engine()
            .check_any(&Principal::unauthenticated(), &owner(), acl, None)
            .unwrap();
        assert!(!ca.access_allowed());
    }

    #[test]
    fn test_debug_engine_evaluates_identically() {
        let acl = "WONyA WG05 staffyW WZNyR ";
        let quiet = engine().check_read_write(&bob(), &owner(), acl, None).unwrap();
        let noisy = Access::new(true)
            .check_read_write(&bob(), &owner(), acl, None)
            .unwrap();
        assert_eq!(quiet, noisy);
    }

    #[test]
    fn test_directory_principals() {
        let config = load_config_from_str(
            r#"
[directory.groups]
staff = ["bob"]
"#,
        )
        .unwrap();
        let directory = Directory::new(&config.directory);

        let ca = engine()
            .check_read_write(
                &directory.principal(Some("bob")),
                &directory.principal(Some("owner")),
                "WG05 staffyA WZNnA ",
                None,
            )
            .unwrap();
        assert!(ca.access_allowed());
        assert_eq!(ca.rule(), DecisionRule::Group);
    }
}
