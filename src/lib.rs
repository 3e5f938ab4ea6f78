//! Accesshub - access-control resolution core
//!
//! Resolves a user's effective permission set from direct grants,
//! role-mediated grants and group-mediated grants over a hierarchical group
//! forest, and answers authorization and menu-visibility queries against an
//! immutable snapshot of the access-control data.

pub mod authz;
pub mod errors;
pub mod settings;
