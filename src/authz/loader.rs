use std::collections::{HashMap, HashSet};
use std::path::Path;

use uuid::Uuid;

use crate::authz::errors::AuthzError;
use crate::authz::hierarchy;
use crate::authz::index::GrantIndex;
use crate::authz::types::{Group, Membership, PermissionPair, Role, SnapshotData, User};
use crate::authz::{ResolutionPolicy, Snapshot};

/// Read a snapshot document from a JSON file and compile it. This is the
/// file-backed stand-in for the storage collaborator: whatever supplies the
/// document, the engine only ever sees the compiled, validated result.
pub fn load_snapshot(path: &Path, policy: ResolutionPolicy) -> Result<Snapshot, AuthzError> {
    let contents = std::fs::read_to_string(path).map_err(|source| AuthzError::SnapshotLoad {
        path: path.display().to_string(),
        source,
    })?;
    let data: SnapshotData = serde_json::from_str(&contents)?;
    compile_snapshot(data, policy)
}

/// Compile raw snapshot collections into an immutable [`Snapshot`],
/// performing all cross-entity integrity validation up front so the pure
/// resolution paths never have to re-check it. Violations are surfaced,
/// never dropped.
pub fn compile_snapshot(
    data: SnapshotData,
    policy: ResolutionPolicy,
) -> Result<Snapshot, AuthzError> {
    let mut users = HashMap::new();
    let mut user_names = HashSet::new();
    for user in data.users {
        let key = if policy.username_case_insensitive {
            user.user_name.to_lowercase()
        } else {
            user.user_name.clone()
        };
        if !user_names.insert(key) {
            return Err(AuthzError::DuplicateName {
                entity: "user",
                name: user.user_name,
            });
        }
        users.insert(user.id, user);
    }

    // Audit back-references are display-only but must still resolve.
    for user in users.values() {
        for reference in [user.created_by, user.updated_by].into_iter().flatten() {
            if !users.contains_key(&reference) {
                return Err(AuthzError::DanglingReference {
                    entity: "user",
                    id: user.id,
                    referenced: "user",
                    referenced_id: reference,
                });
            }
        }
    }

    let mut groups = HashMap::new();
    let mut group_names = HashSet::new();
    for group in data.groups {
        if !group_names.insert(group.group_name.clone()) {
            return Err(AuthzError::DuplicateName {
                entity: "group",
                name: group.group_name,
            });
        }
        groups.insert(group.id, group);
    }
    hierarchy::check_forest(&groups)?;

    let mut roles = HashMap::new();
    let mut role_names = HashSet::new();
    for role in data.roles {
        if !role_names.insert(role.role_name.clone()) {
            return Err(AuthzError::DuplicateName {
                entity: "role",
                name: role.role_name,
            });
        }
        roles.insert(role.id, role);
    }

    let mut permissions = HashMap::new();
    let mut permission_names = HashSet::new();
    for permission in data.permissions {
        if !permission_names.insert(permission.permission_name.clone()) {
            return Err(AuthzError::DuplicateName {
                entity: "permission",
                name: permission.permission_name,
            });
        }
        permissions.insert(permission.id, permission);
    }

    let mut attributes = HashMap::new();
    for attribute in data.attributes {
        attributes.insert(attribute.id, attribute);
    }

    let mut attribute_links = HashSet::new();
    for link in data.attribute_links {
        if !permissions.contains_key(&link.permission_id) {
            return Err(AuthzError::DanglingReference {
                entity: "attribute link",
                id: link.attribute_id,
                referenced: "permission",
                referenced_id: link.permission_id,
            });
        }
        if !attributes.contains_key(&link.attribute_id) {
            return Err(AuthzError::DanglingReference {
                entity: "attribute link",
                id: link.permission_id,
                referenced: "attribute",
                referenced_id: link.attribute_id,
            });
        }
        attribute_links.insert(link);
    }

    let mut memberships_by_user: HashMap<Uuid, Vec<Membership>> = HashMap::new();
    for membership in data.memberships {
        check_membership(&membership, &users, &groups, &roles)?;
        memberships_by_user
            .entry(membership.user_id)
            .or_default()
            .push(membership);
    }

    let grants = GrantIndex::build(&data.grants, &permissions, &attributes, &attribute_links)?;

    let menu_ids: HashSet<Uuid> = data.menu.iter().map(|n| n.id).collect();
    for node in &data.menu {
        if let Some(parent_id) = node.parent_id {
            if !menu_ids.contains(&parent_id) {
                return Err(AuthzError::DanglingReference {
                    entity: "menu node",
                    id: node.id,
                    referenced: "parent menu node",
                    referenced_id: parent_id,
                });
            }
        }
    }

    let mut api_resources: HashMap<(String, String), PermissionPair> = HashMap::new();
    for resource in &data.api_resources {
        let key = (resource.method.to_uppercase(), resource.path.clone());
        if api_resources.insert(key, resource.pair()).is_some() {
            return Err(AuthzError::DuplicateResource {
                method: resource.method.clone(),
                path: resource.path.clone(),
            });
        }
    }

    let snapshot = Snapshot {
        version: 0,
        policy,
        users,
        groups,
        roles,
        permissions,
        attributes,
        attribute_links,
        memberships_by_user,
        grants,
        menu: data.menu,
        api_resources,
    };

    tracing::info!(
        users = snapshot.users.len(),
        groups = snapshot.groups.len(),
        roles = snapshot.roles.len(),
        permissions = snapshot.permissions.len(),
        grants = snapshot.grants.grant_count(),
        menu_nodes = snapshot.menu.len(),
        api_resources = snapshot.api_resources.len(),
        "Compiled authorization snapshot"
    );

    Ok(snapshot)
}

fn check_membership(
    membership: &Membership,
    users: &HashMap<Uuid, User>,
    groups: &HashMap<Uuid, Group>,
    roles: &HashMap<Uuid, Role>,
) -> Result<(), AuthzError> {
    if !users.contains_key(&membership.user_id) {
        return Err(AuthzError::DanglingReference {
            entity: "membership",
            id: membership.user_id,
            referenced: "user",
            referenced_id: membership.user_id,
        });
    }
    if !groups.contains_key(&membership.group_id) {
        return Err(AuthzError::DanglingReference {
            entity: "membership",
            id: membership.user_id,
            referenced: "group",
            referenced_id: membership.group_id,
        });
    }
    if !roles.contains_key(&membership.role_id) {
        return Err(AuthzError::DanglingReference {
            entity: "membership",
            id: membership.user_id,
            referenced: "role",
            referenced_id: membership.role_id,
        });
    }
    Ok(())
}
