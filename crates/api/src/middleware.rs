use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use tollgate_infra::Parser;

use crate::context::store_user;

#[derive(Clone)]
pub struct AuthState {
    pub parser: Arc<dyn Parser>,
}

/// Parses the `Authorization` header and stores the resulting user in the
/// request extensions. Any failure ends the request with 401 and the error
/// text as body.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let header = extract_authorization(req.headers())?.to_owned();

    let user = state.parser.parse(&header).await.map_err(|e| {
        warn!(error = %e, "rejected credential");
        (StatusCode::UNAUTHORIZED, e.to_string())
    })?;

    debug!(member_ids = ?user.member_ids, is_dummy = user.is_dummy, "request authenticated");
    store_user(req.extensions_mut(), user);

    Ok(next.run(req).await)
}

fn extract_authorization(headers: &HeaderMap) -> Result<&str, (StatusCode, String)> {
    let required = || {
        (
            StatusCode::UNAUTHORIZED,
            "Authorization header required".to_string(),
        )
    };

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(required)?;

    let header = header.to_str().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            "Authorization header is not valid ASCII".to_string(),
        )
    })?;

    if header.is_empty() {
        return Err(required());
    }

    Ok(header)
}
