use chrono::Utc;
use uuid::Uuid;

use accesshub::authz::errors::AuthzError;
use accesshub::authz::loader::compile_snapshot;
use accesshub::authz::types::*;
use accesshub::authz::{ResolutionPolicy, Snapshot};

/// Builder for test users
pub struct UserBuilder {
    user_name: String,
    is_active: bool,
    is_2fa_enabled: bool,
    soft_deleted: bool,
}

impl UserBuilder {
    pub fn new(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            is_active: true,
            is_2fa_enabled: false,
            soft_deleted: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn soft_deleted(mut self) -> Self {
        self.soft_deleted = true;
        self
    }

    pub fn requires_2fa(mut self) -> Self {
        self.is_2fa_enabled = true;
        self
    }

    pub fn build(self) -> User {
        User {
            id: Uuid::new_v4(),
            user_name: self.user_name,
            password_hash: String::new(),
            is_active: self.is_active,
            is_2fa_enabled: self.is_2fa_enabled,
            deleted_date: self.soft_deleted.then(Utc::now),
            created_by: None,
            updated_by: None,
        }
    }
}

/// Accumulates raw snapshot collections and compiles them, so tests read as
/// a sequence of administrative operations.
#[derive(Default)]
pub struct SnapshotBuilder {
    data: SnapshotData,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&mut self, user: User) -> Uuid {
        let id = user.id;
        self.data.users.push(user);
        id
    }

    pub fn named_user(&mut self, name: &str) -> Uuid {
        self.user(UserBuilder::new(name).build())
    }

    pub fn group(&mut self, name: &str, parent_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.data.groups.push(Group {
            id,
            group_name: name.to_string(),
            is_active: true,
            parent_id,
            deleted_date: None,
        });
        id
    }

    pub fn role(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.data.roles.push(Role {
            id,
            role_name: name.to_string(),
            is_active: true,
            deleted_date: None,
        });
        id
    }

    /// Create a permission (grantable to all principal kinds), an attribute,
    /// and the link row pairing them.
    pub fn permission_pair(&mut self, permission: &str, attribute: &str) -> PermissionPair {
        let permission_id = Uuid::new_v4();
        let attribute_id = Uuid::new_v4();
        self.data.permissions.push(Permission {
            id: permission_id,
            permission_name: permission.to_string(),
            is_user: true,
            is_role: true,
            is_group: true,
        });
        self.data.attributes.push(PermissionAttribute {
            id: attribute_id,
            name: attribute.to_string(),
            description: None,
        });
        self.data.attribute_links.push(AttributeLink {
            permission_id,
            attribute_id,
        });
        PermissionPair::new(permission_id, attribute_id)
    }

    pub fn grant(&mut self, kind: PrincipalKind, principal_id: Uuid, pair: PermissionPair) {
        self.data.grants.push(Grant {
            principal_kind: kind,
            principal_id,
            permission_id: pair.permission_id,
            attribute_id: pair.attribute_id,
        });
    }

    pub fn membership(&mut self, user_id: Uuid, group_id: Uuid, role_id: Uuid) {
        self.data.memberships.push(Membership {
            user_id,
            group_id,
            role_id,
        });
    }

    pub fn api_resource(&mut self, method: &str, path: &str, pair: PermissionPair) {
        self.data.api_resources.push(ApiResource {
            method: method.to_string(),
            path: path.to_string(),
            permission_id: pair.permission_id,
            attribute_id: pair.attribute_id,
        });
    }

    pub fn menu_item(
        &mut self,
        name: &str,
        parent_id: Option<Uuid>,
        position: i32,
        gate: Option<PermissionPair>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.data.menu.push(MenuNode {
            id,
            name: name.to_string(),
            parent_id,
            position,
            url: Some(format!("/{}", name.replace(' ', "-").to_lowercase())),
            parent_only: false,
            gate,
        });
        id
    }

    pub fn menu_header(&mut self, name: &str, position: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.data.menu.push(MenuNode {
            id,
            name: name.to_string(),
            parent_id: None,
            position,
            url: None,
            parent_only: true,
            gate: None,
        });
        id
    }

    pub fn data(&self) -> &SnapshotData {
        &self.data
    }

    pub fn compile(self) -> Result<Snapshot, AuthzError> {
        self.compile_with(ResolutionPolicy::default())
    }

    pub fn compile_with(self, policy: ResolutionPolicy) -> Result<Snapshot, AuthzError> {
        compile_snapshot(self.data, policy)
    }
}
