//! `Authorization` header parsing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use tollgate_auth::extract::{is_dummy, member_ids, privileged_from_claims, requires_exchange};
use tollgate_auth::{AuthConfig, User, bearer_token, user_from_claims};
use tollgate_core::{AuthError, AuthResult, ClaimSet};

use crate::fetcher::{BearerFetcher, CachedBearerFetcher, GraphqlBearerFetcher};
use crate::verifier::{Rs256Verifier, TokenVerifier};

/// Turns an `Authorization` header value into a [`User`].
#[async_trait]
pub trait Parser: Send + Sync {
    async fn parse(&self, authorization: &str) -> AuthResult<Arc<User>>;
}

#[async_trait]
impl<T: Parser + ?Sized> Parser for Arc<T> {
    async fn parse(&self, authorization: &str) -> AuthResult<Arc<User>> {
        (**self).parse(authorization).await
    }
}

/// Verifies bearer JWTs and builds users from their claims, exchanging
/// reduced tokens for full ones when the claims ask for it.
pub struct JwtParser {
    config: AuthConfig,
    verifier: Arc<dyn TokenVerifier>,
    fetcher: Option<Arc<dyn BearerFetcher>>,
}

impl JwtParser {
    pub fn new(config: AuthConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            config,
            verifier,
            fetcher: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn BearerFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// RS256 verification with the configured key, plus a cached GraphQL
    /// fetcher when a fetcher URL is configured.
    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        let verifier = Rs256Verifier::from_pem(&config.public_key, config.ignore_expiration)?;
        let fetcher = match config.fetcher_url.as_deref() {
            Some(url) => {
                let client = GraphqlBearerFetcher::new(url)
                    .map_err(|e| AuthError::configuration(format!("fetcher client: {e}")))?;
                Some(Arc::new(CachedBearerFetcher::new(client)) as Arc<dyn BearerFetcher>)
            }
            None => None,
        };

        Ok(Self {
            config,
            verifier: Arc::new(verifier),
            fetcher,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[instrument(skip_all, err)]
    async fn exchange(&self, authorization: &str, reduced: &ClaimSet) -> AuthResult<User> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| AuthError::token_exchange("no full-token fetcher configured"))?;

        let member_id = member_ids(reduced, &self.config)
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::token_exchange("reduced token carries no member id"))?;

        let full = fetcher.fetch(&member_id, authorization).await.map_err(|e| {
            warn!(member_id = %member_id, error = %e, "full token fetch failed");
            AuthError::from(e)
        })?;
        let raw = full.strip_prefix("Bearer ").unwrap_or(full.as_str());

        let claims = self
            .verifier
            .verify(raw)
            .map_err(|e| AuthError::token_exchange(format!("full token rejected: {e}")))?;
        if requires_exchange(&claims, &self.config) {
            return Err(AuthError::token_exchange(
                "full token asks for another exchange",
            ));
        }

        let mut user = user_from_claims(&format!("Bearer {raw}"), &claims, &self.config)?;
        // Callers only ever see the credential they sent.
        user.authorization = authorization.to_string();
        user.privileged_member = privileged_from_claims(reduced, &self.config);

        info!(member_id = %member_id, "reduced token exchanged");
        Ok(user)
    }
}

#[async_trait]
impl Parser for JwtParser {
    async fn parse(&self, authorization: &str) -> AuthResult<Arc<User>> {
        let token = bearer_token(authorization)?;

        if is_dummy(authorization, &self.config) {
            debug!("dummy token");
            return Ok(Arc::new(User::dummy(authorization)));
        }

        let claims = self.verifier.verify(token)?;

        let user = if requires_exchange(&claims, &self.config) {
            self.exchange(authorization, &claims).await?
        } else {
            user_from_claims(authorization, &claims, &self.config)?
        };

        Ok(Arc::new(user))
    }
}

impl core::fmt::Debug for JwtParser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtParser")
            .field("config", &self.config)
            .field("fetcher", &self.fetcher.is_some())
            .finish_non_exhaustive()
    }
}
