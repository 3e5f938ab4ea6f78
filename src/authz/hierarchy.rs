use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::authz::errors::AuthzError;
use crate::authz::types::Group;

/// Ordered ancestor chain of a group, closest parent first, derived by
/// repeated arena lookup with a visited set. A parent cycle is a
/// data-integrity violation and fails fast instead of looping.
pub fn ancestors(groups: &HashMap<Uuid, Group>, group_id: Uuid) -> Result<Vec<Uuid>, AuthzError> {
    let group = groups.get(&group_id).ok_or(AuthzError::NotFound {
        entity: "group",
        id: group_id,
    })?;

    let mut chain = Vec::new();
    let mut visited = HashSet::from([group_id]);
    let mut current = group.parent_id;

    while let Some(parent_id) = current {
        if !visited.insert(parent_id) {
            return Err(AuthzError::CyclicHierarchy { group_id: parent_id });
        }
        let parent = groups.get(&parent_id).ok_or(AuthzError::DanglingReference {
            entity: "group",
            id: group_id,
            referenced: "parent group",
            referenced_id: parent_id,
        })?;
        chain.push(parent_id);
        current = parent.parent_id;
    }

    Ok(chain)
}

/// The set of groups whose grants apply for a membership in `group_id`:
/// the group itself plus, when inheritance is enabled, all its ancestors
/// (a child group is a narrowing of a broader one, so it inherits upward).
pub fn in_scope(
    groups: &HashMap<Uuid, Group>,
    group_id: Uuid,
    inherit: bool,
) -> Result<Vec<Uuid>, AuthzError> {
    let mut scope = vec![group_id];
    if inherit {
        scope.extend(ancestors(groups, group_id)?);
    } else if !groups.contains_key(&group_id) {
        return Err(AuthzError::NotFound {
            entity: "group",
            id: group_id,
        });
    }
    Ok(scope)
}

/// Eager whole-forest validation run at snapshot compile time: every parent
/// reference resolves and no parent chain cycles. Chains already proven
/// acyclic are memoized so the walk is linear over the forest.
pub fn check_forest(groups: &HashMap<Uuid, Group>) -> Result<(), AuthzError> {
    let mut verified: HashSet<Uuid> = HashSet::new();

    for (&start, _) in groups {
        if verified.contains(&start) {
            continue;
        }

        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut current = start;

        loop {
            if verified.contains(&current) {
                break;
            }
            if !on_path.insert(current) {
                return Err(AuthzError::CyclicHierarchy { group_id: current });
            }
            path.push(current);

            let group = groups.get(&current).ok_or(AuthzError::DanglingReference {
                entity: "group",
                id: *path.get(path.len().saturating_sub(2)).unwrap_or(&current),
                referenced: "parent group",
                referenced_id: current,
            })?;

            match group.parent_id {
                Some(parent) => current = parent,
                None => break,
            }
        }

        verified.extend(path);
    }

    Ok(())
}
