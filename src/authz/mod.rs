pub mod engine;
pub mod errors;
pub mod hierarchy;
pub mod index;
pub mod loader;
pub mod menu;
pub mod types;
pub mod web;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use index::GrantIndex;
use types::{AttributeLink, Group, Membership, MenuNode, Permission, PermissionAttribute, PermissionPair, Role, User};

/// Resolution policy knobs fixed at configuration time.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionPolicy {
    /// Whether a child group inherits the grants of its ancestors
    /// (the conventional RBAC reading; configurable because the source
    /// schema does not pin the inheritance direction down).
    pub group_inheritance: bool,
    /// Whether user names compare case-insensitively for uniqueness.
    pub username_case_insensitive: bool,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            group_inheritance: true,
            username_case_insensitive: false,
        }
    }
}

/// Fully compiled authorization snapshot. Immutable after construction;
/// every resolution, authorization and menu-filter call is a pure function
/// of one of these, so arbitrarily many may run in parallel over it.
#[derive(Debug)]
pub struct Snapshot {
    /// Generation number, stamped by the [`SnapshotStore`] on swap.
    /// Suitable as a cache key together with a user id.
    pub version: u64,
    pub policy: ResolutionPolicy,
    pub users: HashMap<Uuid, User>,
    pub groups: HashMap<Uuid, Group>,
    pub roles: HashMap<Uuid, Role>,
    pub permissions: HashMap<Uuid, Permission>,
    pub attributes: HashMap<Uuid, PermissionAttribute>,
    pub attribute_links: HashSet<AttributeLink>,
    /// user id -> membership triples for that user
    pub memberships_by_user: HashMap<Uuid, Vec<Membership>>,
    pub grants: GrantIndex,
    pub menu: Vec<MenuNode>,
    /// (method, exact path) -> required pair; unmatched requests deny.
    pub api_resources: HashMap<(String, String), PermissionPair>,
}

impl Snapshot {
    /// Required (permission, attribute) pair for an exact (method, path)
    /// match, if any. Methods compare case-insensitively.
    pub fn required_pair(&self, method: &str, path: &str) -> Option<PermissionPair> {
        self.api_resources
            .get(&(method.to_uppercase(), path.to_string()))
            .copied()
    }
}

/// Holder for the live snapshot. Refreshing after an administrative change is
/// an atomic whole-snapshot swap: readers see either the old snapshot in full
/// or the new one in full, never a partial mix.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    generation: AtomicU64,
}

impl SnapshotStore {
    pub fn new(mut snapshot: Snapshot) -> Self {
        snapshot.version = 0;
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            generation: AtomicU64::new(0),
        }
    }

    /// The live snapshot. Callers keep the returned `Arc` for the duration of
    /// one decision so a concurrent swap cannot tear it.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Swap in a freshly compiled snapshot, stamping the next generation
    /// number. Returns the stamped version.
    pub fn swap(&self, mut snapshot: Snapshot) -> u64 {
        let version = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        snapshot.version = version;
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(snapshot);
        version
    }
}
