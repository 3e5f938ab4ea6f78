use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::authz::engine::resolve_effective;
use crate::authz::errors::AuthzError;
use crate::authz::types::{MenuNode, PermissionPair};
use crate::authz::Snapshot;

/// A visible menu node with its visible children, siblings ordered by
/// (position, id).
#[derive(Debug, Clone, Serialize)]
pub struct MenuEntry {
    pub id: Uuid,
    pub name: String,
    pub url: Option<String>,
    pub parent_only: bool,
    /// The declared gate, reported as metadata. For parent-only nodes it
    /// never participates in the visibility decision.
    pub gate: Option<PermissionPair>,
    pub children: Vec<MenuEntry>,
}

/// Prune the menu forest to the nodes the user's effective permission set
/// satisfies. This is a post-order transform: children are filtered first,
/// and a parent-only header is kept iff at least one child survived, never
/// on its own gate, even if it nominally carries a satisfied one.
pub fn filter_menu(snapshot: &Snapshot, user_id: Uuid) -> Result<Vec<MenuEntry>, AuthzError> {
    let effective = resolve_effective(snapshot, user_id)?;

    let mut children_of: HashMap<Option<Uuid>, Vec<&MenuNode>> = HashMap::new();
    for node in &snapshot.menu {
        children_of.entry(node.parent_id).or_default().push(node);
    }
    for siblings in children_of.values_mut() {
        siblings.sort_by_key(|n| (n.position, n.id));
    }

    Ok(visible_level(&children_of, None, &effective))
}

fn visible_level(
    children_of: &HashMap<Option<Uuid>, Vec<&MenuNode>>,
    parent: Option<Uuid>,
    effective: &HashSet<PermissionPair>,
) -> Vec<MenuEntry> {
    let Some(siblings) = children_of.get(&parent) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for node in siblings {
        let children = visible_level(children_of, Some(node.id), effective);

        let visible = if node.parent_only {
            !children.is_empty()
        } else {
            node.gate.map_or(true, |pair| effective.contains(&pair))
        };

        if visible {
            entries.push(MenuEntry {
                id: node.id,
                name: node.name.clone(),
                url: node.url.clone(),
                parent_only: node.parent_only,
                gate: node.gate,
                children,
            });
        }
    }
    entries
}
