use std::collections::HashSet;

use uuid::Uuid;

use crate::authz::errors::AuthzError;
use crate::authz::hierarchy;
use crate::authz::types::{AttributeLink, PermissionPair, PrincipalKind};
use crate::authz::Snapshot;

/// Outcome of an authorization check. Deny is a normal, expected result,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Compute the effective permission set for a user: the union of direct
/// grants, grants of every role held across all memberships, and grants of
/// every in-scope group of every membership.
///
/// Role grants are not group-scoped in the data model: once a user holds a
/// role through any membership, that role's grants apply everywhere. This is
/// an explicit design choice carried over from the source schema, not an
/// oversight.
///
/// A disabled or soft-deleted user resolves to the empty set regardless of
/// grants. Grants attached to soft-deleted or inactive roles and groups
/// contribute nothing, but a membership referencing a role or group missing
/// from the snapshot entirely is an integrity error.
pub fn resolve_effective(
    snapshot: &Snapshot,
    user_id: Uuid,
) -> Result<HashSet<PermissionPair>, AuthzError> {
    let user = snapshot.users.get(&user_id).ok_or(AuthzError::NotFound {
        entity: "user",
        id: user_id,
    })?;

    if !user.is_live() {
        return Ok(HashSet::new());
    }

    let mut effective: HashSet<PermissionPair> = snapshot
        .grants
        .pairs_for(PrincipalKind::User, user_id)
        .iter()
        .copied()
        .collect();

    let Some(memberships) = snapshot.memberships_by_user.get(&user_id) else {
        return Ok(effective);
    };

    for membership in memberships {
        let role = snapshot
            .roles
            .get(&membership.role_id)
            .ok_or(AuthzError::DanglingReference {
                entity: "membership",
                id: membership.user_id,
                referenced: "role",
                referenced_id: membership.role_id,
            })?;
        if role.is_live() {
            effective.extend(snapshot.grants.pairs_for(PrincipalKind::Role, role.id));
        }

        if !snapshot.groups.contains_key(&membership.group_id) {
            return Err(AuthzError::DanglingReference {
                entity: "membership",
                id: membership.user_id,
                referenced: "group",
                referenced_id: membership.group_id,
            });
        }

        for group_id in hierarchy::in_scope(
            &snapshot.groups,
            membership.group_id,
            snapshot.policy.group_inheritance,
        )? {
            if let Some(group) = snapshot.groups.get(&group_id) {
                if group.is_live() {
                    effective.extend(snapshot.grants.pairs_for(PrincipalKind::Group, group_id));
                }
            }
        }
    }

    Ok(effective)
}

/// Fallible authorization check: maps (method, path) through the API resource
/// table and tests membership in the effective set. Callers wanting the
/// fail-closed boolean should use [`authorize`]; this variant surfaces the
/// underlying error so data-quality problems stay observable.
pub fn try_authorize(
    snapshot: &Snapshot,
    method: &str,
    path: &str,
    user_id: Uuid,
) -> Result<Decision, AuthzError> {
    // No matching resource entry: deny by default, no wildcard matching.
    let Some(required) = snapshot.required_pair(method, path) else {
        return Ok(Decision::Deny);
    };

    // A resource mapped to a pair the link table does not know is corrupt
    // administrative data. Report it; the wrapper turns it into a deny.
    let link = AttributeLink {
        permission_id: required.permission_id,
        attribute_id: required.attribute_id,
    };
    if !snapshot.attribute_links.contains(&link) {
        return Err(AuthzError::UnlinkedAttribute {
            permission_id: required.permission_id,
            attribute_id: required.attribute_id,
        });
    }

    let effective = resolve_effective(snapshot, user_id)?;
    if effective.contains(&required) {
        Ok(Decision::Allow)
    } else {
        Ok(Decision::Deny)
    }
}

/// Fail-closed authorization: every error condition becomes a deny for the
/// purpose of the decision, while the underlying error is still reported
/// through the log so corruption is never silently masked.
pub fn authorize(snapshot: &Snapshot, method: &str, path: &str, user_id: Uuid) -> Decision {
    match try_authorize(snapshot, method, path, user_id) {
        Ok(decision) => decision,
        Err(err) => {
            tracing::warn!(
                method,
                path,
                %user_id,
                integrity = err.is_integrity(),
                error = %err,
                "authorization failed closed"
            );
            Decision::Deny
        }
    }
}
