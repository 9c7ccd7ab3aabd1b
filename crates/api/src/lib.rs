//! HTTP API: authentication middleware, request context and a small
//! introspection router.

pub mod app;
pub mod context;
pub mod middleware;
