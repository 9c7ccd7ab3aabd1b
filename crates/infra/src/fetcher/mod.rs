//! Full-token exchange.
//!
//! A reduced token only identifies the caller; the full token with groups
//! and orgs is fetched from the admin service on demand.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tollgate_core::AuthError;

mod cached;
mod client;

pub use cached::CachedBearerFetcher;
pub use client::{GET_BEARER_QUERY, GraphqlBearerFetcher};

/// Errors from a full-token fetch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("error fetching permissions data: {description} ({code})")]
    Advise {
        code: String,
        description: String,
        level: Option<String>,
    },

    #[error("response carried no token")]
    MissingToken,
}

impl From<FetchError> for AuthError {
    fn from(err: FetchError) -> Self {
        AuthError::token_exchange(err.to_string())
    }
}

/// Exchanges a reduced credential for the member's full token.
#[async_trait]
pub trait BearerFetcher: Send + Sync {
    /// `authorization` is the caller's reduced `Bearer` header, forwarded
    /// as-is. Returns the raw full token.
    async fn fetch(&self, member_id: &str, authorization: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: BearerFetcher + ?Sized> BearerFetcher for Arc<T> {
    async fn fetch(&self, member_id: &str, authorization: &str) -> Result<String, FetchError> {
        (**self).fetch(member_id, authorization).await
    }
}
