//! HTTP application wiring: the auth layer plus introspection routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use tollgate_auth::{Entitlements, PermissionKind, Role, Service};
use tollgate_infra::Parser;

use crate::context::CurrentUser;
use crate::middleware;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(parser: Arc<dyn Parser>) -> Router {
    let auth_state = middleware::AuthState { parser };

    let protected = Router::new()
        .route("/me", get(me))
        .route("/permissions/check", get(check_permission))
        .route("/orgs", get(orgs))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new().route("/health", get(health)).merge(protected)
}

async fn health() -> &'static str {
    "ok"
}

async fn me(user: CurrentUser) -> Json<Value> {
    Json(json!({
        "member_ids": user.member_ids,
        "is_dummy": user.is_dummy,
        "is_admin": user.permissions.is_admin(),
        "privileged_member": user.privileged_member,
        "groups": user.permissions.groups_by_type(),
        "orgs": user.orgs.entries(),
    }))
}

#[derive(Debug, Deserialize)]
struct CheckQuery {
    product: String,
    object: String,
    /// One flag character, e.g. `r`.
    kind: String,
    /// Comma separated group filter.
    #[serde(default)]
    groups: Option<String>,
}

async fn check_permission(
    user: CurrentUser,
    Query(query): Query<CheckQuery>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let mut chars = query.kind.chars();
    let kind = match (chars.next(), chars.next()) {
        (Some(c), None) => PermissionKind::from_char(c),
        _ => return Err((StatusCode::BAD_REQUEST, "kind must be a single flag character")),
    };

    let filter: Vec<&str> = query
        .groups
        .as_deref()
        .map(|g| g.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let (groups, granted) = user.check_permission(&query.product, &query.object, kind, &filter);

    Ok(Json(json!({ "granted": granted, "groups": groups })))
}

#[derive(Debug, Deserialize)]
struct OrgsQuery {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    service: Option<String>,
}

async fn orgs(user: CurrentUser, Query(query): Query<OrgsQuery>) -> Json<Value> {
    let min_role = query.role.as_deref().map(Role::from_claim).unwrap_or_default();
    let service = query.service.map(Service::new);
    let orgs = user.orgs_with_role(min_role, service.as_ref());
    Json(json!({ "role": min_role, "orgs": orgs }))
}
