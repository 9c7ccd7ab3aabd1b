use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{Extensions, StatusCode, request::Parts};

use tollgate_auth::User;

/// The authenticated caller of a request.
///
/// Inserted into request extensions by the auth middleware; handlers take it
/// as an extractor. Requests without one are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<User>);

impl CurrentUser {
    pub fn user(&self) -> &Arc<User> {
        &self.0
    }
}

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Attach `user` to a request's extensions, replacing any previous one.
pub fn store_user(extensions: &mut Extensions, user: Arc<User>) {
    extensions.insert(CurrentUser(user));
}

pub fn load_user(extensions: &Extensions) -> Option<Arc<User>> {
    extensions.get::<CurrentUser>().map(|u| u.0.clone())
}

/// Carry the user from one request over to another (e.g. an outgoing call
/// made on the caller's behalf). Returns whether there was one to copy.
pub fn copy_user(from: &Extensions, to: &mut Extensions) -> bool {
    match load_user(from) {
        Some(user) => {
            store_user(to, user);
            true
        }
        None => false,
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "no authenticated user"))
    }
}
