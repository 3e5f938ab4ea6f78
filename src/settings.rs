use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::authz::ResolutionPolicy;
use crate::errors::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub snapshot: Snapshot,
    pub policy: Policy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Path to the JSON snapshot document supplied by the storage layer.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Child groups inherit ancestor grants (conventional RBAC reading).
    #[serde(default = "default_group_inheritance")]
    pub group_inheritance: bool,
    /// Compare user names case-insensitively for uniqueness.
    #[serde(default)]
    pub username_case_insensitive: bool,
}

fn default_group_inheritance() -> bool {
    true
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/snapshot.json"),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            group_inheritance: true,
            username_case_insensitive: false,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)?
            .set_default("server.port", Server::default().port)?
            .set_default(
                "snapshot.path",
                Snapshot::default().path.to_string_lossy().to_string(),
            )?
            .set_default("policy.group_inheritance", Policy::default().group_inheritance)?
            .set_default(
                "policy.username_case_insensitive",
                Policy::default().username_case_insensitive,
            )?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: ACCESSHUB__SERVER__PORT=9090, etc.
        builder =
            builder.add_source(config::Environment::with_prefix("ACCESSHUB").separator("__"));

        let cfg = builder.build()?;
        let mut s: Settings = cfg.try_deserialize()?;

        // Normalize the snapshot path to be relative to the current dir
        if s.snapshot.path.is_relative() {
            s.snapshot.path = std::env::current_dir()?.join(&s.snapshot.path);
        }

        Ok(s)
    }

    pub fn resolution_policy(&self) -> ResolutionPolicy {
        ResolutionPolicy {
            group_inheritance: self.policy.group_inheritance,
            username_case_insensitive: self.policy.username_case_insensitive,
        }
    }
}
