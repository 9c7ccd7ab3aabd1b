//! Closure-backed [`Parser`] for tests that do not need real tokens.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use tollgate_auth::User;
use tollgate_core::AuthResult;

use crate::parser::Parser;

type ParseFuture = Pin<Box<dyn Future<Output = AuthResult<User>> + Send>>;
type ParseFn = dyn Fn(String) -> ParseFuture + Send + Sync;

/// A parser that delegates to a closure.
///
/// ```
/// use tollgate_auth::User;
/// use tollgate_infra::testing::FnParser;
///
/// let parser = FnParser::new(|header: &str| {
///     Ok(User { authorization: header.to_string(), ..Default::default() })
/// });
/// # let _ = parser;
/// ```
pub struct FnParser {
    parse: Box<ParseFn>,
}

impl FnParser {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> AuthResult<User> + Send + Sync + 'static,
    {
        let parse: Box<ParseFn> = Box::new(move |header: String| -> ParseFuture {
            let result = f(&header);
            Box::pin(async move { result })
        });
        Self { parse }
    }

    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AuthResult<User>> + Send + 'static,
    {
        let parse: Box<ParseFn> = Box::new(move |header: String| -> ParseFuture { Box::pin(f(header)) });
        Self { parse }
    }
}

#[async_trait]
impl Parser for FnParser {
    async fn parse(&self, authorization: &str) -> AuthResult<Arc<User>> {
        (self.parse)(authorization.to_string()).await.map(Arc::new)
    }
}

impl core::fmt::Debug for FnParser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnParser").finish_non_exhaustive()
    }
}
