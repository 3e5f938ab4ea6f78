use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::authz::errors::AuthzError;
use crate::authz::types::{AttributeLink, Grant, Permission, PermissionAttribute, PermissionPair, PrincipalKind};

/// Indexed grant rows: (principal kind, principal id) -> (permission, attribute)
/// pairs. Built in a single pass over the grant table; lookups are O(1) average
/// per principal.
#[derive(Debug, Clone, Default)]
pub struct GrantIndex {
    by_principal: HashMap<(PrincipalKind, Uuid), Vec<PermissionPair>>,
    grant_count: usize,
}

impl GrantIndex {
    /// Build the index, validating every grant row against the permission
    /// catalogue. Invalid rows are surfaced as integrity errors, never dropped:
    /// a grant whose (permission, attribute) pair has no link row, or whose
    /// principal kind the permission does not allow, is administrative data
    /// corruption the caller must see.
    pub fn build(
        grants: &[Grant],
        permissions: &HashMap<Uuid, Permission>,
        attributes: &HashMap<Uuid, PermissionAttribute>,
        links: &HashSet<AttributeLink>,
    ) -> Result<Self, AuthzError> {
        let mut by_principal: HashMap<(PrincipalKind, Uuid), Vec<PermissionPair>> = HashMap::new();

        for grant in grants {
            let permission =
                permissions
                    .get(&grant.permission_id)
                    .ok_or(AuthzError::DanglingReference {
                        entity: "grant",
                        id: grant.principal_id,
                        referenced: "permission",
                        referenced_id: grant.permission_id,
                    })?;

            if !attributes.contains_key(&grant.attribute_id) {
                return Err(AuthzError::DanglingReference {
                    entity: "grant",
                    id: grant.principal_id,
                    referenced: "attribute",
                    referenced_id: grant.attribute_id,
                });
            }

            let link = AttributeLink {
                permission_id: grant.permission_id,
                attribute_id: grant.attribute_id,
            };
            if !links.contains(&link) {
                return Err(AuthzError::UnlinkedAttribute {
                    permission_id: grant.permission_id,
                    attribute_id: grant.attribute_id,
                });
            }

            if !permission.allows(grant.principal_kind) {
                return Err(AuthzError::ApplicabilityViolation {
                    permission_id: grant.permission_id,
                    kind: grant.principal_kind,
                    principal_id: grant.principal_id,
                });
            }

            by_principal
                .entry((grant.principal_kind, grant.principal_id))
                .or_default()
                .push(grant.pair());
        }

        let grant_count = grants.len();
        Ok(Self {
            by_principal,
            grant_count,
        })
    }

    /// All pairs granted directly to the given principal. Duplicates are
    /// possible (the effective set is deduplicated by the engine's union).
    pub fn pairs_for(&self, kind: PrincipalKind, principal_id: Uuid) -> &[PermissionPair] {
        self.by_principal
            .get(&(kind, principal_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn grant_count(&self) -> usize {
        self.grant_count
    }
}
