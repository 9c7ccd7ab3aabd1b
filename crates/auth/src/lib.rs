//! `tollgate-auth`: the authorization model.
//!
//! Everything here is pure: claims in, [`User`] out. Verification, token
//! exchange and HTTP wiring live in `tollgate-infra` and `tollgate-api`.

pub mod builder;
pub mod config;
pub mod entitlements;
pub mod extract;
pub mod flags;
pub mod matrix;
pub mod orgs;
pub mod permissions;
pub mod roles;
pub mod service;
pub mod tree;
pub mod user;

pub use builder::{BuildPolicy, PermissionTreeBuilder, build_permissions};
pub use config::AuthConfig;
pub use entitlements::Entitlements;
pub use extract::{bearer_token, user_from_claims};
pub use flags::{PermissionKind, decode_flags};
pub use matrix::PermissionMatrix;
pub use orgs::{OrgRoleEntry, OrgRoles, ServiceRole};
pub use permissions::Permissions;
pub use roles::Role;
pub use service::Service;
pub use tree::{AncestorTree, GroupForest, GroupTree};
pub use user::User;
