//! From verified claims to a [`User`].
//!
//! Verification and token exchange happen elsewhere; everything here is pure
//! and driven by an explicit [`AuthConfig`].

use tracing::debug;

use tollgate_core::{AuthError, AuthResult, ClaimSet, ClaimValue};

use crate::builder::PermissionTreeBuilder;
use crate::config::AuthConfig;
use crate::orgs::OrgRoles;
use crate::user::User;

const BEARER_SCHEME: &str = "Bearer";

/// The token part of a `Bearer <token>` header.
pub fn bearer_token(header: &str) -> AuthResult<&str> {
    let mut parts = header.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token)) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredentialFormat),
    }
}

/// True when `header` carries the configured dummy token.
pub fn is_dummy(header: &str, config: &AuthConfig) -> bool {
    match (config.dummy_token(), bearer_token(header)) {
        (Some(dummy), Ok(token)) => token == dummy,
        _ => false,
    }
}

/// Whether the claims mark a reduced token that must be exchanged.
pub fn requires_exchange(claims: &ClaimSet, config: &AuthConfig) -> bool {
    config
        .fetch_needed_claim
        .as_deref()
        .and_then(|name| claims.get_bool(name))
        .unwrap_or(false)
}

/// Values of the configured member-id claims that are strings, in config order.
pub fn member_ids(claims: &ClaimSet, config: &AuthConfig) -> Vec<String> {
    config
        .member_id_claims
        .iter()
        .filter_map(|name| claims.get_str(name))
        .map(str::to_string)
        .collect()
}

/// The privileged-member flag; absent or non-boolean reads as `false`.
pub fn privileged_from_claims(claims: &ClaimSet, config: &AuthConfig) -> bool {
    config
        .privileged_member_claim
        .as_deref()
        .and_then(|name| claims.get_bool(name))
        .unwrap_or(false)
}

/// Build the user for verified `claims`.
///
/// Each configured groups claim present in `claims` seeds one root of the
/// permission tree. A missing groups or orgs claim yields empty entitlements.
pub fn user_from_claims(header: &str, claims: &ClaimSet, config: &AuthConfig) -> AuthResult<User> {
    let policy = config.build_policy();

    let roots: Vec<&ClaimValue> = config
        .groups_claims
        .iter()
        .filter_map(|name| claims.get(name))
        .collect();

    let permissions = PermissionTreeBuilder::new()
        .admin_group(config.admin_group.as_deref())
        .policy(policy)
        .build(roots)?;

    let orgs = match config.orgs_claim.as_deref().and_then(|name| claims.get(name)) {
        Some(claim) => OrgRoles::from_claim(claim, policy)?,
        None => OrgRoles::default(),
    };

    let user = User {
        authorization: header.to_string(),
        permissions,
        orgs,
        member_ids: member_ids(claims, config),
        is_dummy: false,
        privileged_member: privileged_from_claims(claims, config),
        privileged_org: config.privileged_org.clone(),
    };

    debug!(
        member_ids = ?user.member_ids,
        is_admin = user.permissions.is_admin(),
        orgs = user.orgs.entries().len(),
        "user extracted from claims"
    );

    Ok(user)
}
