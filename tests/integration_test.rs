mod helpers;

use std::collections::HashSet;

use accesshub::authz::engine::{authorize, resolve_effective, Decision};
use accesshub::authz::errors::AuthzError;
use accesshub::authz::menu::filter_menu;
use accesshub::authz::types::PrincipalKind;
use accesshub::authz::{ResolutionPolicy, SnapshotStore};
use helpers::{SnapshotBuilder, UserBuilder};

/// The canonical walkthrough: user u is a member of group g (parent p) with
/// role r; p carries the only grant, mapped to GET /reports/export.
#[test]
fn inherited_group_grant_authorizes_mapped_route() {
    let mut sb = SnapshotBuilder::new();
    let u = sb.named_user("u");
    let p = sb.group("p", None);
    let g = sb.group("g", Some(p));
    let r = sb.role("r");
    let pair = sb.permission_pair("reports.view", "export");
    sb.grant(PrincipalKind::Group, p, pair);
    sb.membership(u, g, r);
    sb.api_resource("GET", "/reports/export", pair);
    let snapshot = sb.compile().unwrap();

    let effective = resolve_effective(&snapshot, u).unwrap();
    assert_eq!(effective, HashSet::from([pair]));

    assert_eq!(
        authorize(&snapshot, "GET", "/reports/export", u),
        Decision::Allow
    );
    // Same pair, unmapped route: default deny
    assert_eq!(
        authorize(&snapshot, "GET", "/reports", u),
        Decision::Deny
    );
}

#[test]
fn effective_set_is_union_of_all_sources() {
    let mut sb = SnapshotBuilder::new();
    let alice = sb.named_user("alice");
    let eng = sb.group("engineering", None);
    let admin = sb.role("admin");

    let direct = sb.permission_pair("profile.edit", "write");
    let via_role = sb.permission_pair("users.manage", "full");
    let via_group = sb.permission_pair("reports.view", "read");

    sb.grant(PrincipalKind::User, alice, direct);
    sb.grant(PrincipalKind::Role, admin, via_role);
    sb.grant(PrincipalKind::Group, eng, via_group);
    sb.membership(alice, eng, admin);

    let snapshot = sb.compile().unwrap();
    let effective = resolve_effective(&snapshot, alice).unwrap();
    assert_eq!(effective, HashSet::from([direct, via_role, via_group]));
}

#[test]
fn grants_survive_promotion_to_an_ancestor() {
    // Three-level chain: org <- dept <- team. A grant anywhere on the chain
    // is visible to a member of team.
    let mut sb = SnapshotBuilder::new();
    let bob = sb.named_user("bob");
    let org = sb.group("org", None);
    let dept = sb.group("dept", Some(org));
    let team = sb.group("team", Some(dept));
    let member = sb.role("member");
    let pair = sb.permission_pair("wiki.read", "read");
    sb.grant(PrincipalKind::Group, org, pair);
    sb.membership(bob, team, member);

    let snapshot = sb.compile().unwrap();
    assert!(resolve_effective(&snapshot, bob).unwrap().contains(&pair));
}

#[test]
fn disabled_and_deleted_users_resolve_empty() {
    let mut sb = SnapshotBuilder::new();
    let disabled = sb.user(UserBuilder::new("disabled").disabled().build());
    let deleted = sb.user(UserBuilder::new("deleted").soft_deleted().build());
    let grp = sb.group("grp", None);
    let role = sb.role("role");
    let pair = sb.permission_pair("reports.view", "read");
    for id in [disabled, deleted] {
        sb.grant(PrincipalKind::User, id, pair);
        sb.membership(id, grp, role);
    }
    sb.grant(PrincipalKind::Group, grp, pair);
    sb.api_resource("GET", "/reports", pair);

    let snapshot = sb.compile().unwrap();
    for id in [disabled, deleted] {
        assert!(resolve_effective(&snapshot, id).unwrap().is_empty());
        assert_eq!(authorize(&snapshot, "GET", "/reports", id), Decision::Deny);
    }
}

#[test]
fn two_factor_flag_is_opaque_to_resolution() {
    // 2FA is the authentication layer's concern; it must not change grants.
    let mut sb = SnapshotBuilder::new();
    let gina = sb.user(UserBuilder::new("gina").requires_2fa().build());
    let pair = sb.permission_pair("reports.view", "read");
    sb.grant(PrincipalKind::User, gina, pair);

    let snapshot = sb.compile().unwrap();
    assert_eq!(
        resolve_effective(&snapshot, gina).unwrap(),
        HashSet::from([pair])
    );
}

#[test]
fn cyclic_hierarchy_fails_compilation() {
    let mut sb = SnapshotBuilder::new();
    let a = sb.group("a", None);
    let b = sb.group("b", Some(a));
    // Introduce the cycle behind the builder's back
    let mut data = sb.data().clone();
    data.groups[0].parent_id = Some(b);

    let err = accesshub::authz::loader::compile_snapshot(data, ResolutionPolicy::default())
        .unwrap_err();
    assert!(matches!(err, AuthzError::CyclicHierarchy { .. }));
}

#[test]
fn menu_prunes_to_the_effective_set() {
    let mut sb = SnapshotBuilder::new();
    let carol = sb.named_user("carol");
    let pair = sb.permission_pair("reports.view", "read");
    let hidden = sb.permission_pair("billing.view", "read");
    sb.grant(PrincipalKind::User, carol, pair);

    let reports = sb.menu_header("Reports", 1);
    sb.menu_item("Monthly", Some(reports), 1, Some(pair));
    let billing = sb.menu_header("Billing", 2);
    sb.menu_item("Invoices", Some(billing), 1, Some(hidden));
    sb.menu_item("Home", None, 0, None);

    let snapshot = sb.compile().unwrap();
    let menu = filter_menu(&snapshot, carol).unwrap();

    let names: Vec<_> = menu.iter().map(|e| e.name.as_str()).collect();
    // Home is ungated; Reports survives through its child; Billing collapses
    assert_eq!(names, vec!["Home", "Reports"]);
    assert_eq!(menu[1].children[0].name, "Monthly");
}

#[test]
fn snapshot_swap_changes_decisions_atomically() {
    let mut sb = SnapshotBuilder::new();
    let dave = sb.named_user("dave");
    let pair = sb.permission_pair("reports.view", "read");
    sb.grant(PrincipalKind::User, dave, pair);
    sb.api_resource("GET", "/reports", pair);
    let granted = sb.compile().unwrap();

    // Second snapshot: same universe, grant revoked
    let mut sb = SnapshotBuilder::new();
    let dave2 = sb.named_user("dave");
    let pair2 = sb.permission_pair("reports.view", "read");
    sb.api_resource("GET", "/reports", pair2);
    let revoked = sb.compile().unwrap();

    let store = SnapshotStore::new(granted);
    let before = store.current();
    assert_eq!(
        authorize(&before, "GET", "/reports", dave),
        Decision::Allow
    );

    store.swap(revoked);
    let after = store.current();
    assert_eq!(authorize(&after, "GET", "/reports", dave2), Decision::Deny);

    // The reader that resolved against the old snapshot still sees it whole
    assert_eq!(
        authorize(&before, "GET", "/reports", dave),
        Decision::Allow
    );
    assert!(after.version > before.version);
}

#[test]
fn menu_output_is_deterministic() {
    let mut sb = SnapshotBuilder::new();
    let erin = sb.named_user("erin");
    sb.menu_item("c", None, 2, None);
    sb.menu_item("a", None, 1, None);
    sb.menu_item("b", None, 2, None);
    let snapshot = sb.compile().unwrap();

    let first = filter_menu(&snapshot, erin).unwrap();
    let second = filter_menu(&snapshot, erin).unwrap();
    let order = |entries: &[accesshub::authz::menu::MenuEntry]| {
        entries.iter().map(|e| e.id).collect::<Vec<_>>()
    };
    assert_eq!(order(&first), order(&second));
    assert_eq!(first[0].name, "a");
}

#[test]
fn flat_policy_ignores_ancestor_grants() {
    let mut sb = SnapshotBuilder::new();
    let frank = sb.named_user("frank");
    let parent = sb.group("parent", None);
    let child = sb.group("child", Some(parent));
    let member = sb.role("member");
    let pair = sb.permission_pair("reports.view", "read");
    sb.grant(PrincipalKind::Group, parent, pair);
    sb.membership(frank, child, member);

    let snapshot = sb
        .compile_with(ResolutionPolicy {
            group_inheritance: false,
            ..Default::default()
        })
        .unwrap();
    assert!(resolve_effective(&snapshot, frank).unwrap().is_empty());
}
