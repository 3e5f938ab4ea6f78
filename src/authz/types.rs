use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kind of principal a grant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    Role,
    Group,
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalKind::User => write!(f, "user"),
            PrincipalKind::Role => write!(f, "role"),
            PrincipalKind::Group => write!(f, "group"),
        }
    }
}

/// A (permission, attribute) pair, the unit of the effective permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionPair {
    pub permission_id: Uuid,
    pub attribute_id: Uuid,
}

impl PermissionPair {
    pub fn new(permission_id: Uuid, attribute_id: Uuid) -> Self {
        Self {
            permission_id,
            attribute_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    /// Opaque to the engine; verification is the authentication layer's job.
    #[serde(default)]
    pub password_hash: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_2fa_enabled: bool,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    /// Audit back-references, resolved lazily by the storage layer.
    /// Never part of the authorization computation.
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub updated_by: Option<Uuid>,
}

impl User {
    /// Account-level kill switch: a disabled or soft-deleted user resolves
    /// to the empty permission set no matter what is granted.
    pub fn is_live(&self) -> bool {
        self.is_active && self.deleted_date.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub group_name: String,
    pub is_active: bool,
    /// Parent reference; the groups form a forest, validated acyclic on load.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
}

impl Group {
    pub fn is_live(&self) -> bool {
        self.is_active && self.deleted_date.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub role_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
}

impl Role {
    pub fn is_live(&self) -> bool {
        self.is_active && self.deleted_date.is_none()
    }
}

/// A user holds a role within a group context. This triple is the only
/// mechanism by which a user "has" a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub permission_name: String,
    /// Applicability flags: which grant tables may reference this permission.
    pub is_user: bool,
    pub is_role: bool,
    pub is_group: bool,
}

impl Permission {
    pub fn allows(&self, kind: PrincipalKind) -> bool {
        match kind {
            PrincipalKind::User => self.is_user,
            PrincipalKind::Role => self.is_role,
            PrincipalKind::Group => self.is_group,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionAttribute {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Explicit many-to-many link; a grant may only pair an attribute with a
/// permission through one of these rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeLink {
    pub permission_id: Uuid,
    pub attribute_id: Uuid,
}

/// A grant row, discriminated by principal kind. One tagged type replaces the
/// three parallel user/role/group tables of the administrative schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub principal_kind: PrincipalKind,
    pub principal_id: Uuid,
    pub permission_id: Uuid,
    pub attribute_id: Uuid,
}

impl Grant {
    pub fn pair(&self) -> PermissionPair {
        PermissionPair::new(self.permission_id, self.attribute_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Sibling sort key; ties broken by id for determinism.
    pub position: i32,
    #[serde(default)]
    pub url: Option<String>,
    /// A pure grouping header: visible iff at least one descendant is visible.
    /// Its own gate, if present, is metadata only.
    #[serde(default)]
    pub parent_only: bool,
    /// No gate means visible to any authenticated user.
    #[serde(default)]
    pub gate: Option<PermissionPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResource {
    /// HTTP method, uppercase, e.g. "GET".
    pub method: String,
    /// Exact path; no wildcard or prefix matching.
    pub path: String,
    pub permission_id: Uuid,
    pub attribute_id: Uuid,
}

impl ApiResource {
    pub fn pair(&self) -> PermissionPair {
        PermissionPair::new(self.permission_id, self.attribute_id)
    }
}

/// Raw snapshot document as supplied by the storage collaborator: whole,
/// internally consistent collections, never incremental queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub attributes: Vec<PermissionAttribute>,
    #[serde(default)]
    pub attribute_links: Vec<AttributeLink>,
    #[serde(default)]
    pub grants: Vec<Grant>,
    #[serde(default)]
    pub menu: Vec<MenuNode>,
    #[serde(default)]
    pub api_resources: Vec<ApiResource>,
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    /// Sorted for stable output; the effective set itself is unordered.
    pub permissions: Vec<PermissionPair>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    /// e.g. "GET"
    pub method: String,
    /// e.g. "/reports/export"
    pub path: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct MenuRequest {
    pub user_id: Uuid,
}
