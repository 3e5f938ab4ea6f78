use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::authz::types::PrincipalKind;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("{entity} `{id}` not found in snapshot")]
    #[diagnostic(
        code(accesshub::authz::not_found),
        help("The snapshot supplied by the storage layer does not contain this entity")
    )]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Grant pairs attribute `{attribute_id}` with permission `{permission_id}` without a link row")]
    #[diagnostic(
        code(accesshub::authz::unlinked_attribute),
        help("An attribute may only qualify a permission through an explicit permission-attribute link")
    )]
    UnlinkedAttribute {
        permission_id: Uuid,
        attribute_id: Uuid,
    },

    #[error("Permission `{permission_id}` is not grantable to {kind} `{principal_id}`")]
    #[diagnostic(
        code(accesshub::authz::applicability),
        help("Check the permission's is_user/is_role/is_group flags against the grant's principal kind")
    )]
    ApplicabilityViolation {
        permission_id: Uuid,
        kind: PrincipalKind,
        principal_id: Uuid,
    },

    #[error("Cyclic group hierarchy detected at group `{group_id}`")]
    #[diagnostic(
        code(accesshub::authz::cyclic_hierarchy),
        help("Group parent chains must be acyclic; fix the parent_id references in the source data")
    )]
    CyclicHierarchy { group_id: Uuid },

    #[error("{entity} `{id}` references missing {referenced} `{referenced_id}`")]
    #[diagnostic(
        code(accesshub::authz::dangling_reference),
        help("Every cross-entity reference in the snapshot must resolve to an entity in the same snapshot")
    )]
    DanglingReference {
        entity: &'static str,
        id: Uuid,
        referenced: &'static str,
        referenced_id: Uuid,
    },

    #[error("Duplicate {entity} name `{name}`")]
    #[diagnostic(
        code(accesshub::authz::duplicate_name),
        help("User, group, role and permission names are globally unique")
    )]
    DuplicateName { entity: &'static str, name: String },

    #[error("Duplicate API resource mapping for {method} {path}")]
    #[diagnostic(
        code(accesshub::authz::duplicate_resource),
        help("Each (method, path) pair may map to exactly one required permission")
    )]
    DuplicateResource { method: String, path: String },

    #[error("Failed to load snapshot file `{path}`")]
    #[diagnostic(
        code(accesshub::authz::snapshot_load),
        help("Check that the file exists and is readable")
    )]
    SnapshotLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot document: {0}")]
    #[diagnostic(
        code(accesshub::authz::snapshot_parse),
        help("The snapshot must be a JSON document matching the SnapshotData collections")
    )]
    SnapshotParse(#[from] serde_json::Error),
}

impl AuthzError {
    /// Whether this error signals administrative data corruption, as opposed
    /// to an entity simply being absent. Integrity errors should be alerted
    /// on by the surrounding system, never silently folded into a deny.
    pub fn is_integrity(&self) -> bool {
        !matches!(
            self,
            AuthzError::NotFound { .. }
                | AuthzError::SnapshotLoad { .. }
                | AuthzError::SnapshotParse(_)
        )
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthzError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
